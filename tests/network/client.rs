use crate::mock::{Call, MockTransport, Outcome};
use nbhttp::network::application::http::{
    Accepted, ClientSession, Error, MAX_RESPONSE_SIZE, Method, Options, State,
};
use nbhttp::network::error::Error as NetworkError;
use nbhttp::network::{Event, Handle, Ipv4Addr, Link, Resolution, SocketAddrV4, TlsOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ADDR: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);
const FIRST: Handle = Handle(1);

fn session() -> ClientSession<crate::mock::Recorder> {
    ClientSession::new(Options::default())
}

#[test]
fn get_round_trip() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    let accepted = client
        .get(&mut transport, "http://example.com/api", None, outcome.handler())
        .unwrap();
    assert_eq!(accepted, Accepted::Resolving);
    assert_eq!(client.state(), State::ResolvingDns);
    assert_eq!(client.handle(), Some(FIRST));
    assert_eq!(
        transport.calls,
        vec![
            Call::Open(FIRST),
            Call::Resolve(FIRST, "example.com".to_string())
        ]
    );

    client.handle_event(&mut transport, Event::Resolved(Some(ADDR)));
    assert_eq!(client.state(), State::Connecting);
    assert_eq!(
        transport.calls.last(),
        Some(&Call::Connect(FIRST, SocketAddrV4::new(ADDR, 80), Link::Plain))
    );

    client.handle_event(&mut transport, Event::Connected);
    assert_eq!(client.state(), State::AwaitingResponse);
    assert_eq!(
        transport.sent(FIRST),
        vec![
            b"GET /api HTTP/1.0\r\nHost: example.com:80\r\nConnection: close\r\nUser-Agent: nbhttp\r\n\r\n"
                .to_vec()
        ]
    );

    client.handle_event(&mut transport, Event::Sent);
    client.handle_event(&mut transport, Event::Received(b"HTTP/1.0 200 OK\r\n\r\nhello"));
    assert!(outcome.delivered().is_empty());

    client.handle_event(&mut transport, Event::Disconnected);
    assert_eq!(
        outcome.delivered(),
        vec![(
            200,
            b"hello".to_vec(),
            b"HTTP/1.0 200 OK\r\n\r\nhello".to_vec()
        )]
    );
    assert_eq!(outcome.drops(), 1);
    assert_eq!(transport.closes(FIRST), 1);
    assert!(client.is_ready());
    assert_eq!(client.handle(), None);
}

#[test]
fn response_split_across_segments() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);
    client.handle_event(&mut transport, Event::Received(b"HTTP/1.0 404 Not"));
    client.handle_event(&mut transport, Event::Received(b" Found\r\nServer: x\r"));
    client.handle_event(&mut transport, Event::Received(b"\n\r\ngone"));
    client.handle_event(&mut transport, Event::Disconnected);

    let delivered = outcome.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, 404);
    assert_eq!(delivered[0].1, b"gone");
}

#[test]
fn random_segmentation_keeps_bytes_in_order() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let body: Vec<u8> = (0..2000).map(|_| rng.gen_range(b'a'..=b'z')).collect();
    let mut response = b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n".to_vec();
    response.extend_from_slice(&body);

    for _ in 0..16 {
        let mut transport = MockTransport::new();
        transport.resolution = Ok(Resolution::Resolved(ADDR));
        let outcome = Outcome::new();
        let mut client = session();
        client
            .get(&mut transport, "http://example.com/data", None, outcome.handler())
            .unwrap();
        client.handle_event(&mut transport, Event::Connected);

        let mut rest = &response[..];
        while !rest.is_empty() {
            let take = rng.gen_range(1..=rest.len().min(300));
            let (chunk, tail) = rest.split_at(take);
            client.handle_event(&mut transport, Event::Received(chunk));
            rest = tail;
        }
        client.handle_event(&mut transport, Event::Disconnected);

        let delivered = outcome.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, 200);
        assert_eq!(delivered[0].1, body);
        assert_eq!(delivered[0].2, response);
    }
}

#[test]
fn post_sends_head_then_body() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let mut client = session();

    client
        .post(
            &mut transport,
            "http://10.0.0.2:8080/led",
            b"{\"on\":true}",
            Some("Content-Type: application/json\r\n"),
            outcome.handler(),
        )
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);

    let sent = transport.sent(FIRST);
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0],
        b"POST /led HTTP/1.0\r\nHost: 10.0.0.2:8080\r\nConnection: close\r\nUser-Agent: nbhttp\r\n\
Content-Type: application/json\r\nContent-Length: 11\r\n\r\n"
            .to_vec()
    );
    assert_eq!(sent[1], b"{\"on\":true}".to_vec());
}

#[test]
fn other_methods_use_their_name() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let mut client = session();

    client
        .request(
            &mut transport,
            "http://example.com/item/3",
            None,
            None,
            Method::Delete,
            outcome.handler(),
        )
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);
    assert!(transport.sent(FIRST)[0].starts_with(b"DELETE /item/3 HTTP/1.0\r\n"));
}

#[test]
fn https_uses_secure_link() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let mut client = session();

    let accepted = client
        .get(&mut transport, "https://example.com/secure", None, outcome.handler())
        .unwrap();
    assert_eq!(accepted, Accepted::Connecting);
    assert_eq!(
        transport.calls.last(),
        Some(&Call::Connect(
            FIRST,
            SocketAddrV4::new(ADDR, 443),
            Link::Secure(TlsOptions::default())
        ))
    );

    client.handle_event(&mut transport, Event::Connected);
    assert!(matches!(
        transport.calls.last(),
        Some(Call::Send(_, _, Link::Secure(_)))
    ));
}

#[test]
fn custom_options_reach_the_wire() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let tls = TlsOptions {
        verify_certificates: false,
        buffer_size: 16384,
    };
    let mut client = ClientSession::new(Options {
        user_agent: "meter/2",
        tls,
    });

    client
        .get(&mut transport, "https://example.com/", None, outcome.handler())
        .unwrap();
    assert_eq!(
        transport.calls.last(),
        Some(&Call::Connect(FIRST, SocketAddrV4::new(ADDR, 443), Link::Secure(tls)))
    );
    client.handle_event(&mut transport, Event::Connected);
    let head = String::from_utf8(transport.sent(FIRST)[0].clone()).unwrap();
    assert!(head.contains("User-Agent: meter/2\r\n"));
}

#[test]
fn bad_scheme_touches_nothing() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    let err = client
        .get(&mut transport, "ftp://x", None, outcome.handler())
        .unwrap_err();
    assert_eq!(err, Error::ProtocolNotValid);
    assert!(transport.calls.is_empty());
    assert!(outcome.delivered().is_empty());
    assert_eq!(outcome.drops(), 1);
    assert!(client.is_ready());
}

#[test]
fn malformed_port_is_rejected() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    let err = client
        .get(&mut transport, "http://host:99999/", None, outcome.handler())
        .unwrap_err();
    assert_eq!(err, Error::MalformedUrl);
    assert!(transport.calls.is_empty());
}

#[test]
fn busy_session_refuses_second_request() {
    let mut transport = MockTransport::new();
    let first = Outcome::new();
    let second = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/a", None, first.handler())
        .unwrap();
    let err = client
        .get(&mut transport, "http://example.com/b", None, second.handler())
        .unwrap_err();

    assert_eq!(err, Error::NotReady);
    assert_eq!(transport.opens(), 1);
    assert_eq!(second.drops(), 1);
    assert!(second.delivered().is_empty());
    assert_eq!(client.state(), State::ResolvingDns);
}

#[test]
fn no_link_means_no_connection() {
    let mut transport = MockTransport::new();
    transport.link_up = false;
    let outcome = Outcome::new();
    let mut client = session();

    let err = client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap_err();
    assert_eq!(err, Error::NoConnection);
    assert_eq!(transport.opens(), 0);
}

#[test]
fn exhausted_transport_is_reported() {
    let mut transport = MockTransport::new();
    transport.open_result = Err(NetworkError::OutOfResources);
    let outcome = Outcome::new();
    let mut client = session();

    let err = client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap_err();
    assert_eq!(err, Error::Transport(NetworkError::OutOfResources));
    assert!(client.is_ready());
}

#[test]
fn oversized_inputs_are_memory_errors() {
    let mut transport = MockTransport::new();
    let mut client = session();

    let headers = "X-Pad: ".to_string() + &"p".repeat(600) + "\r\n";
    let err = client
        .get(&mut transport, "http://example.com/", Some(&headers), Outcome::new().handler())
        .unwrap_err();
    assert_eq!(err, Error::MemError);

    let body = vec![0u8; 2048];
    let err = client
        .post(&mut transport, "http://example.com/", &body, None, Outcome::new().handler())
        .unwrap_err();
    assert_eq!(err, Error::MemError);

    let url = format!("http://{}/", "h".repeat(200));
    let err = client
        .get(&mut transport, &url, None, Outcome::new().handler())
        .unwrap_err();
    assert_eq!(err, Error::MemError);

    assert!(transport.calls.is_empty());
}

#[test]
fn lookup_rejections_release_the_handle() {
    for (failure, expected) in [
        (NetworkError::InvalidAddress, Error::DnsArgError),
        (NetworkError::Timeout, Error::DnsError),
    ] {
        let mut transport = MockTransport::new();
        transport.resolution = Err(failure);
        let outcome = Outcome::new();
        let mut client = session();

        let err = client
            .get(&mut transport, "http://example.com/", None, outcome.handler())
            .unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(transport.closes(FIRST), 1);
        assert!(outcome.delivered().is_empty());
        assert_eq!(outcome.drops(), 1);
        assert!(client.is_ready());
    }
}

#[test]
fn immediate_connect_failure_is_returned() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    transport.connect_result = Err(NetworkError::ConnectionRefused);
    let outcome = Outcome::new();
    let mut client = session();

    let err = client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap_err();
    assert_eq!(err, Error::Transport(NetworkError::ConnectionRefused));
    assert_eq!(transport.closes(FIRST), 1);
    assert!(outcome.delivered().is_empty());
    assert_eq!(outcome.drops(), 1);
    assert!(client.is_ready());
}

#[test]
fn failed_lookup_reports_status_zero() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://nowhere.invalid/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Resolved(None));

    assert_eq!(outcome.delivered(), vec![(0, Vec::new(), Vec::new())]);
    assert_eq!(outcome.drops(), 1);
    assert_eq!(transport.closes(FIRST), 1);
    assert!(client.is_ready());
}

#[test]
fn late_connect_failure_reports_status_zero() {
    let mut transport = MockTransport::new();
    transport.connect_result = Err(NetworkError::OutOfResources);
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Resolved(Some(ADDR)));

    assert_eq!(outcome.delivered(), vec![(0, Vec::new(), Vec::new())]);
    assert_eq!(transport.closes(FIRST), 1);
    assert!(client.is_ready());
}

#[test]
fn connection_error_reports_status_zero() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Resolved(Some(ADDR)));
    client.handle_event(&mut transport, Event::Error(-13));

    assert_eq!(outcome.delivered(), vec![(0, Vec::new(), Vec::new())]);
    assert_eq!(transport.closes(FIRST), 1);

    // A terminal notification arriving twice must not report twice.
    client.handle_event(&mut transport, Event::Disconnected);
    assert_eq!(outcome.delivered().len(), 1);
    assert_eq!(transport.closes(FIRST), 1);
}

#[test]
fn send_failure_reports_status_zero() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    transport.send_result = Err(NetworkError::WriteError);
    let outcome = Outcome::new();
    let mut client = session();

    client
        .post(&mut transport, "http://example.com/", b"x", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);

    assert_eq!(transport.sent(FIRST).len(), 1);
    assert_eq!(outcome.delivered(), vec![(0, Vec::new(), Vec::new())]);
    assert!(client.is_ready());
}

#[test]
fn oversized_response_is_dropped() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/big", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);

    let mut first = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
    first.resize(3000, b'x');
    client.handle_event(&mut transport, Event::Received(&first));
    assert_eq!(client.state(), State::AwaitingResponse);

    let second = vec![b'y'; 2000];
    client.handle_event(&mut transport, Event::Received(&second));
    assert_eq!(client.state(), State::Disconnecting);
    assert_eq!(transport.calls.last(), Some(&Call::Disconnect(FIRST)));
    assert!(outcome.delivered().is_empty());

    client.handle_event(&mut transport, Event::Received(b"more"));
    client.handle_event(&mut transport, Event::Disconnected);

    assert_eq!(outcome.delivered(), vec![(0, Vec::new(), Vec::new())]);
    assert_eq!(outcome.drops(), 1);
    assert_eq!(transport.closes(FIRST), 1);
    assert!(client.is_ready());
}

#[test]
fn response_of_exactly_the_cap_is_kept() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);

    let mut response = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
    response.resize(MAX_RESPONSE_SIZE, b'z');
    client.handle_event(&mut transport, Event::Received(&response));
    client.handle_event(&mut transport, Event::Disconnected);

    let delivered = outcome.delivered();
    assert_eq!(delivered[0].0, 200);
    assert_eq!(delivered[0].2.len(), MAX_RESPONSE_SIZE);
}

#[test]
fn failed_teardown_still_reports() {
    let mut transport = MockTransport::new();
    transport.resolution = Ok(Resolution::Resolved(ADDR));
    transport.disconnect_result = Err(NetworkError::NotOpen);
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);
    let big = vec![b'x'; MAX_RESPONSE_SIZE + 1];
    client.handle_event(&mut transport, Event::Received(&big));

    assert_eq!(outcome.delivered(), vec![(0, Vec::new(), Vec::new())]);
    assert!(client.is_ready());
}

#[test]
fn reset_aborts_without_callback() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    assert_eq!(client.reset(&mut transport), Some(FIRST));

    assert!(client.is_ready());
    assert_eq!(transport.closes(FIRST), 1);
    assert!(outcome.delivered().is_empty());
    assert_eq!(outcome.drops(), 1);

    assert_eq!(client.reset(&mut transport), None);
    client.handle_event(&mut transport, Event::Disconnected);
    assert!(outcome.delivered().is_empty());

    let next = Outcome::new();
    client
        .get(&mut transport, "http://example.com/", None, next.handler())
        .unwrap();
    assert_eq!(transport.opens(), 2);
}

#[test]
fn stray_notifications_are_ignored() {
    let mut transport = MockTransport::new();
    let outcome = Outcome::new();
    let mut client = session();

    client.handle_event(&mut transport, Event::Connected);
    client.handle_event(&mut transport, Event::Received(b"HTTP/1.0 200 OK\r\n\r\n"));
    assert!(transport.calls.is_empty());

    client
        .get(&mut transport, "http://example.com/", None, outcome.handler())
        .unwrap();
    client.handle_event(&mut transport, Event::Connected);
    client.handle_event(&mut transport, Event::Sent);
    assert_eq!(client.state(), State::ResolvingDns);
    assert!(transport.sent(FIRST).is_empty());
}

#[test]
fn session_debug_shows_state_and_handle() {
    let mut transport = MockTransport::new();
    let mut client = session();
    assert_eq!(
        format!("{client:?}"),
        format!("ClientSession {{ options: {:?}, state: Idle, handle: None }}", Options::default())
    );

    client
        .get(&mut transport, "http://example.com/", None, Outcome::new().handler())
        .unwrap();
    let text = format!("{client:?}");
    assert!(text.contains("state: ResolvingDns"));
    assert!(text.contains("handle: Some(Handle(1))"));
}
