//! Tests for external process execution
//!
//! Real Unix processes (`true`, `false`, `sh`) stand in for the converter and the
//! frame extractor.

use super::*;

#[test]
fn test_command_builder() {
    let cmd = ExternalCommand::new("/usr/bin/ffmpeg")
        .arg("-y")
        .args(["-i", "in.mp4"]);
    assert_eq!(cmd.display_name(), "ffmpeg");
    assert_eq!(cmd.get_args().len(), 3);
    assert_eq!(cmd.program(), Path::new("/usr/bin/ffmpeg"));
}

#[test]
fn test_runner_has_at_least_one_slot() {
    let runner = ProcessRunner::new(0, Duration::from_secs(1));
    assert_eq!(runner.available_slots(), 1);
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let runner = ProcessRunner::new(1, Duration::from_secs(5));
    let cmd = ExternalCommand::new("/nonexistent/bin/converter");
    let err = runner.run(&cmd, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ProcessError::Spawn { .. }));
    assert_eq!(err.stage(), "spawn");
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn runner() -> ProcessRunner {
        ProcessRunner::new(2, Duration::from_secs(10))
    }

    fn sh(script: &str) -> ExternalCommand {
        ExternalCommand::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let result = runner()
            .run(&ExternalCommand::new("true"), &CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let err = runner()
            .run(&ExternalCommand::new("false"), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ProcessError::NonZeroExit { program, code } => {
                assert_eq!(program, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_without_output_is_missing_output() {
        let dir = TempDir::new().unwrap();
        let expected = dir.path().join("frame.jpg");
        let err = runner()
            .run_expecting(&ExternalCommand::new("true"), &expected, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::MissingOutput { .. }));
    }

    #[tokio::test]
    async fn test_output_produced() {
        let dir = TempDir::new().unwrap();
        let expected = dir.path().join("frame.jpg");
        let cmd = sh("touch \"$0\"").arg(expected.as_os_str());
        runner()
            .run_expecting(&cmd, &expected, &CancellationToken::new())
            .await
            .unwrap();
        assert!(expected.is_file());
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let runner = ProcessRunner::new(1, Duration::from_millis(200));
        let started = Instant::now();
        let err = runner
            .run(&sh("sleep 10"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
        // the slot is released again
        assert_eq!(runner.available_slots(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_kills_process() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = runner().run(&sh("sleep 10"), &cancel).await.unwrap_err();
        assert!(matches!(err, ProcessError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_already_cancelled_never_spawns() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("ran");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let runner = ProcessRunner::new(1, Duration::from_secs(5));
        // hold the only slot so the cancelled branch is the one that completes
        let _held = Arc::clone(&runner.permits).acquire_owned().await.unwrap();

        let cmd = sh("touch \"$0\"").arg(marker.as_os_str());
        let err = runner.run(&cmd, &cancel).await.unwrap_err();
        assert!(matches!(err, ProcessError::Cancelled { .. }));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let runner = ProcessRunner::new(1, Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let cmd = sh("sleep 0.3");

        let started = Instant::now();
        let (a, b) = tokio::join!(runner.run(&cmd, &cancel), runner.run(&cmd, &cancel));
        a.unwrap();
        b.unwrap();
        // serialized by the single slot
        assert!(started.elapsed() >= Duration::from_millis(550));
    }
}
