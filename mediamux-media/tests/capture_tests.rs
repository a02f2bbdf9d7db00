//! Tests for the capture sink
//!
//! Consumers subscribe through the broadcast channel and observe frames in
//! presentation order followed by an end marker per track.

use bytes::Bytes;
use mediamux_media::*;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

fn push_audio(queues: &MediaQueues, count: i64, level: f32) {
    for i in 0..count {
        queues.audio.push(AudioData::new(
            TimeUnit::from_millis(i * 10),
            48000,
            1,
            vec![level; 480],
        ));
    }
}

fn push_video(queues: &MediaQueues, count: i64) {
    for i in 0..count {
        queues.video.push(VideoData {
            time: TimeUnit::from_millis(i * 40),
            duration: TimeUnit::from_millis(40),
            width: 2,
            height: 2,
            data: Bytes::from_static(&[0; 6]),
            is_keyframe: i == 0,
        });
    }
}

#[tokio::test]
async fn test_capture_config_default() {
    let config = CaptureConfig::default();

    assert_eq!(config.name, "capture");
    assert_eq!(config.render_interval, Duration::from_millis(10));
    assert_eq!(config.channel_capacity, 256);
    assert!(config.require_consumer);
}

#[tokio::test(start_paused = true)]
async fn test_start_without_consumer_fails() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);

    let result = sink.start(TimeUnit::ZERO, &MediaInfo::audio_video());

    match result {
        Err(SinkError::StartFailure { sink: name, .. }) => assert_eq!(name, "capture"),
        other => panic!("expected start failure, got {:?}", other),
    }
    assert!(!sink.is_started());
}

#[tokio::test(start_paused = true)]
async fn test_failed_start_holds_no_frames() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    push_audio(&queues, 5, 0.5);

    assert!(sink.start(TimeUnit::ZERO, &MediaInfo::audio_only()).is_err());
    push_audio(&queues, 1000, 0.5);

    // Frames offered while the sink was not started were never kept
    let _consumer = sink.subscribe();
    sink.start(TimeUnit::ZERO, &MediaInfo::audio_only()).unwrap();
    assert!(!sink.has_unplayed_frames(TrackType::Audio));

    push_audio(&queues, 2, 0.5);
    assert_eq!(sink.unplayed_duration(TrackType::Audio), TimeUnit::from_millis(20));
}

#[tokio::test(start_paused = true)]
async fn test_optional_consumer_allows_start() {
    let queues = MediaQueues::new();
    let config = CaptureConfig {
        require_consumer: false,
        ..CaptureConfig::default()
    };
    let mut sink = CaptureSink::with_config(&queues, config);

    assert!(sink.start(TimeUnit::ZERO, &MediaInfo::audio_video()).is_ok());
    assert!(sink.audio_device().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_capture_publishes_frames_then_end() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    let mut consumer = sink.subscribe();
    push_audio(&queues, 3, 0.5);
    queues.finish();

    sink.set_playing(true);
    sink.start(TimeUnit::ZERO, &MediaInfo::audio_only()).unwrap();

    let ended = sink.on_ended(TrackType::Audio).unwrap();
    assert_eq!(ended.await, TrackEnd::Finished);

    let mut times = Vec::new();
    loop {
        match consumer.recv().await.unwrap() {
            CapturedFrame::Audio(frame) => times.push(frame.time),
            CapturedFrame::Ended(track) => {
                assert_eq!(track, TrackType::Audio);
                break;
            }
            CapturedFrame::Video(_) => panic!("no video was queued"),
        }
    }
    assert_eq!(
        times,
        vec![
            TimeUnit::ZERO,
            TimeUnit::from_millis(10),
            TimeUnit::from_millis(20)
        ]
    );
    assert_eq!(sink.end_time(TrackType::Audio), TimeUnit::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn test_capture_volume_scales_audio() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    let mut consumer = sink.subscribe();
    push_audio(&queues, 1, 0.8);

    sink.set_volume(0.5);
    sink.set_playing(true);
    sink.start(TimeUnit::ZERO, &MediaInfo::audio_only()).unwrap();

    match consumer.recv().await.unwrap() {
        CapturedFrame::Audio(frame) => {
            assert!(frame.samples.iter().all(|&s| (s - 0.4).abs() < 1e-6));
        }
        other => panic!("expected audio, got {:?}", other),
    }
    assert_eq!(sink.volume(), 0.5);
}

#[tokio::test(start_paused = true)]
async fn test_every_consumer_sees_video() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    let handle = sink.handle();
    let mut first = handle.subscribe();
    let mut second = handle.subscribe();
    assert_eq!(handle.consumer_count(), 2);
    push_video(&queues, 2);
    queues.finish();

    sink.set_playing(true);
    sink.start(TimeUnit::ZERO, &MediaInfo::video_only()).unwrap();
    let ended = sink.on_ended(TrackType::Video).unwrap();
    assert_eq!(ended.await, TrackEnd::Finished);

    for consumer in [&mut first, &mut second] {
        let mut frames = 0;
        while let Ok(frame) = consumer.try_recv() {
            match frame {
                CapturedFrame::Video(_) => frames += 1,
                CapturedFrame::Ended(track) => assert_eq!(track, TrackType::Video),
                CapturedFrame::Audio(_) => panic!("no audio was queued"),
            }
        }
        assert_eq!(frames, 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_paused_capture_publishes_nothing() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    let mut consumer = sink.subscribe();
    push_video(&queues, 3);

    sink.start(TimeUnit::ZERO, &MediaInfo::video_only()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(matches!(consumer.try_recv(), Err(TryRecvError::Empty)));
    assert!(sink.has_unplayed_frames(TrackType::Video));
    assert_eq!(sink.unplayed_duration(TrackType::Video), TimeUnit::from_millis(120));
}

#[tokio::test(start_paused = true)]
async fn test_stop_abandons_and_shutdown_is_terminal() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    let _consumer = sink.subscribe();

    sink.start(TimeUnit::ZERO, &MediaInfo::audio_video()).unwrap();
    let audio = sink.on_ended(TrackType::Audio).unwrap();
    sink.stop();
    assert_eq!(audio.await, TrackEnd::Abandoned);
    assert_eq!(sink.state(), SinkState::Idle);

    sink.shutdown();
    assert_eq!(sink.state(), SinkState::Shutdown);
    sink.set_stream_name("late");
    assert_eq!(sink.stream_name(), "");

    let result = sink.start(TimeUnit::ZERO, &MediaInfo::audio_video());
    assert!(matches!(result, Err(SinkError::InvalidState { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_capture_debug_info() {
    let queues = MediaQueues::new();
    let mut sink = CaptureSink::new(&queues);
    let _consumer = sink.subscribe();

    sink.set_stream_name("capture-1");
    sink.set_preserves_pitch(false);
    sink.set_playback_rate(1.5);
    sink.start(TimeUnit::from_millis(250), &MediaInfo::audio_video()).unwrap();

    let mut info = MediaSinkDebugInfo::default();
    sink.debug_info(&mut info);

    assert!(info.presentation.is_none());
    let capture = info.capture.unwrap();
    assert_eq!(capture.sink_id, sink.id().to_string());
    assert!(capture.is_started);
    assert!(!capture.is_playing);
    assert_eq!(capture.position, TimeUnit::from_millis(250));
    assert_eq!(capture.consumers, 1);
    assert_eq!(capture.playback_rate, 1.5);
    assert_eq!(capture.stream_name, "capture-1");
    assert!(!sink.preserves_pitch());
}
