use fixed_stft::stft::{
    FeatureStream, FormatStream, PcmIo, PhaseVocoder, SampleFormat, SinkView, SourceView, StftConfig, StreamParams,
    StreamProcessor, StreamState, S24,
};
use fixed_stft::{FftError, StftError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn params() -> StreamParams {
    StreamParams { sample_rate: 16000, channels: 1, max_frames: 64 }
}

fn config() -> StftConfig {
    StftConfig { frame_length: 256, frame_shift: 64, ..Default::default() }
}

fn run(v: &mut PhaseVocoder<i16>, value: i16) -> Result<Vec<i16>, StftError> {
    let input = vec![value; 64];
    let mut out = vec![0i16; 64];
    let mut src = SourceView::linear(&input);
    let mut sink = SinkView::linear(&mut out);
    v.process(&mut src, &mut sink, 64)?;
    Ok(out)
}

#[test]
fn test_state_transitions() {
    init_logger();
    let mut v = PhaseVocoder::<i16>::new(config());
    assert_eq!(v.state(), StreamState::Uninitialized);
    assert_eq!(run(&mut v, 1000), Err(StftError::NotPrepared));

    v.prepare(params()).unwrap();
    assert_eq!(v.state(), StreamState::Configured);
    run(&mut v, 1000).unwrap();
    assert_eq!(v.state(), StreamState::WarmingUp);
    for _ in 0..3 {
        run(&mut v, 1000).unwrap();
    }
    assert_eq!(v.state(), StreamState::Streaming);

    v.reset().unwrap();
    assert_eq!(v.state(), StreamState::Configured);
    // buffered audio is gone: warm-up starts over
    for _ in 0..3 {
        assert!(run(&mut v, 1000).unwrap().iter().all(|&x| x == 0));
    }
    assert!(run(&mut v, 1000).unwrap().iter().any(|&x| x != 0));

    v.release();
    v.release();
    assert_eq!(v.state(), StreamState::Freed);
    assert_eq!(run(&mut v, 1000), Err(StftError::Freed));
    assert_eq!(v.reset(), Err(StftError::Freed));
    assert_eq!(v.prepare(params()), Err(StftError::Freed));
}

#[test]
fn test_reset_then_release() {
    init_logger();
    let mut v = PhaseVocoder::<i16>::new(config());
    v.prepare(params()).unwrap();
    v.reset().unwrap();
    v.release();
    assert_eq!(v.state(), StreamState::Freed);
}

#[test]
fn test_prepare_rejects_mismatches() {
    init_logger();
    let mut v = PhaseVocoder::<i16>::new(config());
    assert_eq!(
        v.prepare(StreamParams { sample_rate: 48000, ..params() }),
        Err(StftError::SampleRateMismatch { config: 16000, stream: 48000 })
    );
    assert_eq!(v.state(), StreamState::Uninitialized);

    let mut v = PhaseVocoder::<i16>::new(StftConfig { channel: 1, ..config() });
    assert_eq!(v.prepare(params()), Err(StftError::IllegalChannel { channel: 1, channels: 1 }));
    assert!(v.prepare(StreamParams { channels: 2, ..params() }).is_ok());

    let mut v = PhaseVocoder::<i16>::new(StftConfig { frame_length: 1100, ..config() });
    assert_eq!(v.prepare(params()), Err(StftError::Fft(FftError::SizeTooLarge(2048))));

    let mut f = FeatureStream::<i16>::new(StftConfig { low_freq: 9000, ..Default::default() });
    assert!(matches!(f.prepare(params()), Err(StftError::InvalidConfig(_))));
}

#[test]
fn test_reprepare_replaces_buffers() {
    init_logger();
    let mut v = PhaseVocoder::<i16>::new(config());
    v.prepare(params()).unwrap();
    for _ in 0..5 {
        run(&mut v, 2000).unwrap();
    }
    v.prepare(params()).unwrap();
    assert_eq!(v.state(), StreamState::Configured);
    assert!(run(&mut v, 2000).unwrap().iter().all(|&x| x == 0));
}

#[test]
fn test_format_stream_lifecycle() {
    init_logger();
    let mut stream = FormatStream::vocoder(SampleFormat::S24, config());
    assert_eq!(stream.reset(), Ok(()));
    stream.prepare(params()).unwrap();

    let input = vec![S24(1 << 20); 64];
    let mut out = vec![S24::default(); 64];
    for _ in 0..6 {
        let mut src = SourceView::linear(&input);
        let mut sink = SinkView::linear(&mut out);
        stream.process(PcmIo::S24(&mut src, &mut sink), 64).unwrap();
    }
    assert_eq!(stream.state(), StreamState::Streaming);
    assert!(out.iter().any(|s| s.0 != 0));

    stream.release();
    let mut src = SourceView::linear(&input);
    let mut sink = SinkView::linear(&mut out);
    assert_eq!(stream.process(PcmIo::S24(&mut src, &mut sink), 64), Err(StftError::Freed));
}
