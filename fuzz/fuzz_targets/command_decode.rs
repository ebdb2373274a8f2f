//! Arbitrary payloads through the command decoder.

#![no_main]

use cuelight_proto::{Command, MAX_MESSAGE_SIZE, ProtocolError, decode_command};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match decode_command(data) {
        Ok(command) => {
            assert!(data.len() <= MAX_MESSAGE_SIZE);
            assert!(matches!(
                command,
                Command::Trigger { .. } | Command::Release { .. } | Command::Rename { .. } | Command::Ping
            ));
        },
        Err(ProtocolError::PayloadTooLarge { size, max }) => {
            assert_eq!(size, data.len());
            assert!(size > max);
        },
        Err(error) => assert!(!error.detail().is_empty()),
    }
});
