//! Property-Based Tests for the Wire Protocol
//!
//! Every valid command and response survives an encode/decode round trip.

use proptest::prelude::*;

use crate::protocol::{
    read_command, read_get_response, read_set_response, Command, GetResponse, SetResponse, Status,
};

// == Strategies ==
fn bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        (bytes_strategy(), bytes_strategy(), 0..i32::MAX)
            .prop_map(|(key, value, ttl)| Command::Set { key, value, ttl }),
        bytes_strategy().prop_map(|key| Command::Get { key }),
        Just(Command::Join),
    ]
}

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::None),
        Just(Status::Ok),
        Just(Status::Error),
        Just(Status::KeyNotFound),
    ]
}

/// Only OK responses carry a value on the wire.
fn get_response_strategy() -> impl Strategy<Value = GetResponse> {
    prop_oneof![
        bytes_strategy().prop_map(GetResponse::found),
        Just(GetResponse::not_found()),
        Just(GetResponse::error()),
        Just(GetResponse::default()),
    ]
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_command_roundtrip(cmd in command_strategy()) {
        let bytes = cmd.encode().unwrap();
        let decoded = block_on(async { read_command(&mut &bytes[..]).await }).unwrap();
        prop_assert_eq!(decoded, Some(cmd));
    }

    #[test]
    fn prop_command_stream_roundtrip(cmds in prop::collection::vec(command_strategy(), 0..20)) {
        let mut bytes = Vec::new();
        for cmd in &cmds {
            bytes.extend(cmd.encode().unwrap());
        }

        let decoded = block_on(async {
            let mut reader = &bytes[..];
            let mut out = Vec::new();
            while let Some(cmd) = read_command(&mut reader).await.unwrap() {
                out.push(cmd);
            }
            out
        });
        prop_assert_eq!(decoded, cmds);
    }

    #[test]
    fn prop_truncated_command_never_decodes(cmd in command_strategy(), cut in any::<prop::sample::Index>()) {
        let bytes = cmd.encode().unwrap();
        prop_assume!(bytes.len() > 1);
        // Keep at least the tag, drop at least one byte
        let keep = 1 + cut.index(bytes.len() - 1);
        let result = block_on(async { read_command(&mut &bytes[..keep]).await });
        prop_assert!(result.is_err(), "truncated frame decoded: {:?}", result);
    }

    #[test]
    fn prop_set_response_roundtrip(status in status_strategy()) {
        let resp = SetResponse::new(status);
        let bytes = resp.encode();
        let decoded = block_on(async { read_set_response(&mut &bytes[..]).await }).unwrap();
        prop_assert_eq!(decoded, resp);
    }

    #[test]
    fn prop_get_response_roundtrip(resp in get_response_strategy()) {
        let bytes = resp.encode().unwrap();
        let decoded = block_on(async { read_get_response(&mut &bytes[..]).await }).unwrap();
        prop_assert_eq!(decoded, resp);
    }
}
