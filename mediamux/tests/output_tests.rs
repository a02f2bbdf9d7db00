//! End-to-end tests for assembled media outputs
//!
//! Frames flow from the queues through the presentation sink to the
//! simulated device and, when capture is configured, to capture consumers.

use mediamux::*;
use std::time::Duration;

fn push_stream(queues: &MediaQueues, audio_frames: i64) {
    for i in 0..audio_frames {
        queues.audio.push(AudioData::silence(
            TimeUnit::from_millis(i * 20),
            TimeUnit::from_millis(20),
            48000,
            2,
        ));
    }
    queues.finish();
}

fn no_consumer_required() -> CaptureConfig {
    CaptureConfig {
        require_consumer: false,
        ..CaptureConfig::default()
    }
}

#[tokio::test]
async fn test_output_config_default() {
    let config = OutputConfig::default();

    assert!(config.capture.is_none());
    assert!(!config.debug_logging);
    assert_eq!(config.label, "media");
    assert_eq!(config.presentation.name, "presentation");
    assert!(OutputConfig::with_capture().capture.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_local_only_output() {
    let queues = MediaQueues::new();
    let output = SimulatedAudioOutput::new();
    let device = output.handle();
    let mut media = MediaOutput::builder(&queues)
        .audio_output(Box::new(output))
        .build();
    push_stream(&queues, 4);

    assert!(!media.is_multiplexed());
    assert!(media.capture_handle().is_none());

    let sink = media.sink_mut();
    sink.set_playing(true);
    sink.start(TimeUnit::ZERO, &MediaInfo::audio_only()).unwrap();
    let ended = sink.on_ended(TrackType::Audio).unwrap();

    assert_eq!(ended.await, TrackEnd::Finished);
    assert_eq!(device.stats().frames_written, 4);
}

#[tokio::test(start_paused = true)]
async fn test_multiplexed_output_feeds_both_sinks() {
    let queues = MediaQueues::new();
    let output = SimulatedAudioOutput::new();
    let device = output.handle();
    let mut media = MediaOutput::builder(&queues)
        .audio_output(Box::new(output))
        .capture(CaptureConfig::default())
        .label("video#main")
        .build();
    let mut captured = media.capture_handle().unwrap().subscribe();
    push_stream(&queues, 3);

    let sink = media.sink_mut();
    sink.set_stream_name("main");
    sink.set_volume(0.5);
    sink.set_playing(true);
    sink.start(TimeUnit::ZERO, &MediaInfo::audio_only()).unwrap();
    let ended = sink.on_ended(TrackType::Audio).unwrap();
    assert_eq!(ended.await, TrackEnd::Finished);

    let stats = device.stats();
    assert_eq!(stats.frames_written, 3);
    assert_eq!(stats.volume, 0.5);
    assert_eq!(stats.stream_name, "main");

    let mut audio = 0;
    loop {
        match tokio::time::timeout(Duration::from_secs(1), captured.recv()).await {
            Ok(Ok(CapturedFrame::Audio(frame))) => {
                // Local volume does not touch the captured stream
                assert_eq!(frame.samples.len(), 1920);
                audio += 1;
            }
            Ok(Ok(CapturedFrame::Ended(track))) => {
                assert_eq!(track, TrackType::Audio);
                break;
            }
            other => panic!("unexpected capture event: {:?}", other),
        }
    }
    assert_eq!(audio, 3);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_is_absorbed() {
    let queues = MediaQueues::new();
    let mut media = MediaOutput::builder(&queues)
        .config(OutputConfig::with_capture())
        .build();

    // Nobody subscribed, so the capture sink refuses to start
    let sink = media.sink_mut();
    assert_eq!(sink.start(TimeUnit::ZERO, &MediaInfo::audio_video()), Ok(()));
    assert!(sink.is_started());
}

/// The composite reports success when only the capture sink started, while
/// `is_started` keeps following the presentation sink.
#[tokio::test(start_paused = true)]
async fn test_presentation_failure_leaves_output_not_started() {
    let queues = MediaQueues::new();
    let mut media = MediaOutput::builder(&queues)
        .audio_output(Box::new(SimulatedAudioOutput::unavailable()))
        .capture(no_consumer_required())
        .build();

    let sink = media.sink_mut();
    assert_eq!(sink.start(TimeUnit::ZERO, &MediaInfo::audio_video()), Ok(()));
    assert!(!sink.is_started());
    assert!(sink.on_ended(TrackType::Audio).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_both_failures_fail_start() {
    let queues = MediaQueues::new();
    let mut media = MediaOutput::builder(&queues)
        .audio_output(Box::new(SimulatedAudioOutput::unavailable()))
        .capture(CaptureConfig::default())
        .build();

    let result = media
        .sink_mut()
        .start(TimeUnit::ZERO, &MediaInfo::audio_video());

    assert_eq!(result, Err(SinkError::GenericFailure));
    assert!(!result.unwrap_err().is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn test_debug_report_covers_presentation_only() {
    let queues = MediaQueues::new();
    let mut media = MediaOutput::builder(&queues)
        .capture(no_consumer_required())
        .label("audio#2")
        .build();
    media
        .sink_mut()
        .start(TimeUnit::from_millis(40), &MediaInfo::audio_video())
        .unwrap();

    let report = media.debug_report();

    assert_eq!(report.label, "audio#2");
    assert!(report.info.capture.is_none());
    let presentation = report.info.presentation.unwrap();
    assert!(presentation.is_started);
    assert_eq!(presentation.position, TimeUnit::from_millis(40));
}

#[tokio::test(start_paused = true)]
async fn test_video_reaches_output_container() {
    let queues = MediaQueues::new();
    let container = VideoFrameContainer::new();
    let mut media = MediaOutput::builder(&queues)
        .video_container(container.clone())
        .capture(no_consumer_required())
        .build();
    queues.video.push(VideoData {
        time: TimeUnit::ZERO,
        duration: TimeUnit::from_millis(40),
        width: 2,
        height: 2,
        data: vec![0u8; 6].into(),
        is_keyframe: true,
    });
    queues.finish();

    let sink = media.sink_mut();
    sink.set_playing(true);
    sink.start(TimeUnit::ZERO, &MediaInfo::video_only()).unwrap();
    let ended = sink.on_ended(TrackType::Video).unwrap();
    assert_eq!(ended.await, TrackEnd::Finished);

    assert!(media.video_container().ptr_eq(&container));
    assert_eq!(container.frames_presented(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_shuts_sinks_down() {
    let queues = MediaQueues::new();
    let output = SimulatedAudioOutput::new();
    let device = output.handle();
    let mut media = MediaOutput::builder(&queues)
        .audio_output(Box::new(output))
        .build();

    media
        .sink_mut()
        .start(TimeUnit::ZERO, &MediaInfo::audio_only())
        .unwrap();
    assert!(device.stats().is_open);

    drop(media);
    assert!(!device.stats().is_open);
}
