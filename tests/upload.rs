mod common;

use common::{test_image, Fault, SimulatedModule};
use r502_protocol::{
    Config, ConfirmationCode, Error, HeaderError, PacketKind, PacketSize, R502,
};

fn r502_with(module: SimulatedModule, packet_size: PacketSize) -> R502<SimulatedModule> {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = Config::default()
        .with_address(module.address)
        .with_packet_size(packet_size);
    R502::with_config(module, config)
}

#[test]
fn every_packet_size_delivers_twice_the_raw_bytes() {
    for &(selector, size) in &[
        (0, PacketSize::Bytes32),
        (1, PacketSize::Bytes64),
        (2, PacketSize::Bytes128),
        (3, PacketSize::Bytes256),
    ] {
        let mut module = SimulatedModule::new();
        module.packet_size_selector = selector;
        module.image = test_image(size.len(), 5);
        let raw = module.image.clone();
        let mut r502 = r502_with(module, size);

        let mut pixels = Vec::new();
        let mut frame_lengths = Vec::new();
        let mut consumer = |frame: &[u8]| {
            frame_lengths.push(frame.len());
            pixels.extend_from_slice(frame);
        };
        let result = r502.up_image(Some(&mut consumer)).unwrap();

        assert_eq!(result.confirmation_code, ConfirmationCode::Success);
        assert_eq!(result.frames, 5, "{:?}", size);
        assert_eq!(result.bytes_received, raw.len());
        assert_eq!(pixels.len(), 2 * raw.len());
        assert!(frame_lengths.iter().all(|&len| len == 2 * size.len()));

        // the second pixel pair comes from the second raw byte
        assert_eq!(pixels[2], raw[1] & 0xF0);
        assert_eq!(pixels[3], (raw[1] & 0x0F) << 4);
    }
}

#[test]
fn full_sensor_image_arrives_in_one_call() {
    // 192x192 pixels, two per byte
    let raw_len = 192 * 192 / 2;
    let mut module = SimulatedModule::new();
    module.image = test_image(128, raw_len / 128);
    let mut r502 = r502_with(module, PacketSize::Bytes128);

    let mut total = 0;
    let mut consumer = |frame: &[u8]| total += frame.len();
    let result = r502.up_image(Some(&mut consumer)).unwrap();

    assert_eq!(result.frames, 144);
    assert_eq!(total, 192 * 192);
}

#[test]
fn missing_consumer_is_not_ready_and_sends_nothing() {
    let mut module = SimulatedModule::new();
    module.image = test_image(128, 2);
    let mut r502 = r502_with(module, PacketSize::Bytes128);

    assert_eq!(r502.up_image(None), Err(Error::NotReady));
    assert_eq!(r502.release().io_calls(), 0);
}

#[test]
fn refused_upload_streams_nothing() {
    // no image in the buffer: the module answers 0x0F
    let mut r502 = r502_with(SimulatedModule::new(), PacketSize::Bytes128);

    let mut calls = 0;
    let mut consumer = |_: &[u8]| calls += 1;
    let result = r502.up_image(Some(&mut consumer)).unwrap();

    assert_eq!(result.confirmation_code, ConfirmationCode::UploadImageFailed);
    assert_eq!(result.frames, 0);
    assert_eq!(calls, 0);
}

#[test]
fn acknowledgement_in_the_middle_of_the_stream_aborts() {
    let mut module = SimulatedModule::new();
    module.image = test_image(128, 4);
    module.fault_in_data_packet = Some((2, Fault::Kind(PacketKind::Acknowledge)));
    let mut r502 = r502_with(module, PacketSize::Bytes128);

    let mut calls = 0;
    let mut consumer = |_: &[u8]| calls += 1;
    assert_eq!(
        r502.up_image(Some(&mut consumer)),
        Err(Error::Header(HeaderError::Kind { found: 0x07 }))
    );
    assert_eq!(calls, 2);

    let module = r502.release();
    assert_eq!(module.flushes, 1);
    assert!(module.pending.is_empty());
}

#[test]
fn corrupted_data_packet_aborts() {
    let mut module = SimulatedModule::new();
    module.packet_size_selector = 1;
    module.image = test_image(64, 3);
    module.fault_in_data_packet = Some((0, Fault::Checksum));
    let mut r502 = r502_with(module, PacketSize::Bytes64);

    let mut calls = 0;
    let mut consumer = |_: &[u8]| calls += 1;
    let error = r502.up_image(Some(&mut consumer)).unwrap_err();

    assert!(matches!(error, Error::Checksum { .. }), "{:?}", error);
    assert_eq!(calls, 0);
}

#[test]
fn stream_that_stops_early_is_not_found() {
    let mut module = SimulatedModule::new();
    module.packet_size_selector = 0;
    module.image = test_image(32, 6);
    module.stop_stream_after = Some(3);
    let mut r502 = r502_with(module, PacketSize::Bytes32);

    let mut calls = 0;
    let mut consumer = |_: &[u8]| calls += 1;
    assert_eq!(r502.up_image(Some(&mut consumer)), Err(Error::NotFound));
    assert_eq!(calls, 3);
}

#[test]
fn packets_longer_than_the_session_expects_are_rejected() {
    // the module streams 128-byte packets, the session still thinks 64
    let mut module = SimulatedModule::new();
    module.image = test_image(128, 2);
    let mut r502 = r502_with(module, PacketSize::Bytes64);

    let mut consumer = |_: &[u8]| {};
    let error = r502.up_image(Some(&mut consumer)).unwrap_err();
    // only the first 75 bytes are read, so payload bytes 64 and 65 end up as the checksum
    assert_eq!(
        error,
        Error::Checksum {
            computed: 0x0864,
            received: 0x4041,
        }
    );
    assert_eq!(r502.release().flushes, 1);
}
