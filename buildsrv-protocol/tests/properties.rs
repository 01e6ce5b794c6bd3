//! Property tests for the response codec.

use buildsrv_protocol::{Decoder, ProtocolError, ServerResponse, LENGTH_PREFIX_SIZE};
use proptest::prelude::*;

proptest! {
    #[test]
    fn completed_roundtrip(return_code in any::<i32>(), utf8_output in any::<bool>(), output in any::<String>()) {
        let response = ServerResponse::completed(return_code, utf8_output, output.clone());
        let bytes = response.encode().unwrap();

        let decoded = ServerResponse::decode(&bytes).unwrap();
        let completed = decoded.as_completed().unwrap();
        prop_assert_eq!(completed.return_code(), return_code);
        prop_assert_eq!(completed.utf8_output(), utf8_output);
        prop_assert_eq!(completed.output(), output.as_str());
        prop_assert_eq!(completed.error_output(), "");
    }

    #[test]
    fn total_length_counts_everything_after_it(output in ".{0,64}", return_code in any::<i32>()) {
        let bytes = ServerResponse::completed(return_code, true, output).encode().unwrap();
        let declared = u32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        prop_assert_eq!(declared, bytes.len() - LENGTH_PREFIX_SIZE);
    }

    #[test]
    fn off_by_one_length_is_detected(output in ".{0,32}", grow in any::<bool>()) {
        let mut bytes = ServerResponse::completed(0, false, output).encode().unwrap().to_vec();
        let declared = u32::from_le_bytes(bytes[..4].try_into().unwrap());
        let corrupted = if grow { declared + 1 } else { declared - 1 };
        bytes[..4].copy_from_slice(&corrupted.to_le_bytes());

        let result = ServerResponse::decode(&bytes);
        let detected = matches!(
            result,
            Err(ProtocolError::TruncatedStream { .. }) | Err(ProtocolError::TrailingBytes { .. })
        );
        prop_assert!(detected);
    }

    #[test]
    fn decoder_handles_any_split(output in ".{0,48}", split in 0usize..200) {
        let response = ServerResponse::completed(7, true, output);
        let bytes = response.encode().unwrap();
        let split = split.min(bytes.len());

        let mut decoder = Decoder::new();
        decoder.extend(&bytes[..split]);
        let early = decoder.decode_response().unwrap();
        if split < bytes.len() {
            prop_assert!(early.is_none());
            decoder.extend(&bytes[split..]);
            prop_assert_eq!(decoder.decode_response().unwrap(), Some(response));
        } else {
            prop_assert_eq!(early, Some(response));
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = ServerResponse::decode(&bytes);
    }
}
