// End-to-end tests for the mood pipeline
// These use synthetic grayscale photos with known brightness and contrast

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    use crate::config::{Config, API_TOKEN_ENV};
    use crate::emotion::{
        Classification, ClassifierKind, ClassifyError, Confidence, EmotionClassifier,
        EmotionLabel, EmotionScore, RuleBasedClassifier,
    };
    use crate::media::{EmotionToMediaMap, MediaResolver};
    use crate::pipeline::{build_classifier, EmotionPipeline, PipelineError};
    use crate::playback::{PlaybackStatus, PlaybackSurface};
    use crate::report::MediaOutcome;

    // Delegated classifier stand-in that returns fixed detections
    struct FixedClassifier(Vec<EmotionScore>);

    #[async_trait]
    impl EmotionClassifier for FixedClassifier {
        async fn classify(&self, _image: &DynamicImage) -> Result<Classification, ClassifyError> {
            Classification::from_scores(self.0.clone(), ClassifierKind::Remote)
        }

        fn kind(&self) -> ClassifierKind {
            ClassifierKind::Remote
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl EmotionClassifier for FailingClassifier {
        async fn classify(&self, _image: &DynamicImage) -> Result<Classification, ClassifyError> {
            Err(ClassifyError::Classification("connection refused".to_string()))
        }

        fn kind(&self) -> ClassifierKind {
            ClassifierKind::Remote
        }
    }

    // Half the pixels at mean - std, half at mean + std
    fn photo(mean: u8, std: u8) -> DynamicImage {
        let img = GrayImage::from_fn(32, 24, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([mean - std])
            } else {
                Luma([mean + std])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn rule_pipeline(music_dir: &std::path::Path) -> EmotionPipeline {
        EmotionPipeline::new(
            Box::new(RuleBasedClassifier::default()),
            MediaResolver::default(),
            PlaybackSurface::new(music_dir, None),
        )
    }

    fn music_dir_with(clips: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for clip in clips {
            std::fs::write(dir.path().join(clip), b"ID3").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_bright_contrasty_photo_plays_happy() {
        let music = music_dir_with(&["happy.mp3"]);
        let report = rule_pipeline(music.path())
            .process_bytes(&png_bytes(&photo(150, 60)))
            .await
            .unwrap();

        assert_eq!(report.classification.label, EmotionLabel::Happy);
        assert_eq!(report.classification.confidence.value(), 0.8);
        match &report.media {
            MediaOutcome::Resolved { media, playback } => {
                assert_eq!(media.media.as_str(), "happy.mp3");
                assert_eq!(playback, &PlaybackStatus::Ready(music.path().join("happy.mp3")));
            }
            other => panic!("unexpected media outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dark_contrasty_photo_plays_sad() {
        let music = music_dir_with(&["sad.mp3"]);
        let report = rule_pipeline(music.path())
            .process_image(&photo(70, 55))
            .await
            .unwrap();

        assert_eq!(report.classification.label, EmotionLabel::Sad);
        assert_eq!(report.classification.confidence.value(), 0.7);
        assert!(report.playable().is_some());
    }

    #[tokio::test]
    async fn test_flat_dim_photo_is_calm_even_without_clip() {
        let music = music_dir_with(&[]);
        let report = rule_pipeline(music.path())
            .process_image(&photo(100, 20))
            .await
            .unwrap();

        assert_eq!(report.classification.label, EmotionLabel::Calm);
        assert_eq!(report.classification.confidence.value(), 0.65);
        match &report.media {
            MediaOutcome::Resolved { media, playback } => {
                assert_eq!(media.media.as_str(), "calm.mp3");
                assert!(!playback.is_ready());
            }
            other => panic!("unexpected media outcome: {:?}", other),
        }
        assert!(report.render_text(false).contains("Detected Mood: Calm"));
    }

    #[tokio::test]
    async fn test_same_photo_twice_gives_same_report() {
        let music = music_dir_with(&[]);
        let pipeline = rule_pipeline(music.path());
        let image = photo(120, 30);

        let first = pipeline.process_image(&image).await.unwrap();
        let second = pipeline.process_image(&image).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_corrupt_upload_is_invalid_image() {
        let music = music_dir_with(&[]);
        let result = rule_pipeline(music.path()).process_bytes(b"\x89PNG garbage").await;

        let err = result.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
        assert!(err.user_hint().contains("another photo"));
    }

    #[tokio::test]
    async fn test_empty_detections_is_no_face() {
        let music = music_dir_with(&[]);
        let pipeline = EmotionPipeline::new(
            Box::new(FixedClassifier(vec![])),
            MediaResolver::default(),
            PlaybackSurface::new(music.path(), None),
        );

        let err = pipeline.process_image(&photo(128, 10)).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoFaceDetected));
        assert!(err.user_hint().contains("no face"));
        assert!(!err.is_config());
    }

    #[tokio::test]
    async fn test_classifier_failure_is_reported_by_kind() {
        let music = music_dir_with(&[]);
        let pipeline = EmotionPipeline::new(
            Box::new(FailingClassifier),
            MediaResolver::default(),
            PlaybackSurface::new(music.path(), None),
        );

        let err = pipeline.process_image(&photo(128, 10)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Classification(_)));
    }

    #[tokio::test]
    async fn test_delegated_fear_falls_back_to_sad_clip() {
        let music = music_dir_with(&["sad.mp3"]);
        let pipeline = EmotionPipeline::new(
            Box::new(FixedClassifier(vec![
                EmotionScore::new(EmotionLabel::Happy, Confidence::from_fraction(0.1).unwrap()),
                EmotionScore::new(EmotionLabel::Fear, Confidence::from_fraction(0.9).unwrap()),
            ])),
            MediaResolver::default(),
            PlaybackSurface::new(music.path(), None),
        );

        let report = pipeline.process_image(&photo(128, 10)).await.unwrap();
        assert_eq!(report.classification.label, EmotionLabel::Fear);
        assert_eq!(report.classification.distribution.len(), 2);
        match &report.media {
            MediaOutcome::Resolved { media, playback } => {
                assert!(media.is_fallback);
                assert_eq!(media.media.as_str(), "sad.mp3");
                assert!(playback.is_ready());
            }
            other => panic!("unexpected media outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unmapped_label_still_reports_mood() {
        let music = music_dir_with(&[]);
        let map = EmotionToMediaMap::builder().clip(EmotionLabel::Happy).build();
        let pipeline = EmotionPipeline::new(
            Box::new(RuleBasedClassifier::default()),
            MediaResolver::new(map),
            PlaybackSurface::new(music.path(), None),
        );

        let report = pipeline.process_image(&photo(70, 55)).await.unwrap();
        assert_eq!(report.classification.label, EmotionLabel::Sad);
        assert!(matches!(report.media, MediaOutcome::NotFound { .. }));
        assert!(report.playable().is_none());
    }

    #[test]
    fn test_remote_without_token_fails_fast() {
        if std::env::var(API_TOKEN_ENV).is_ok() {
            return;
        }
        let config = Config {
            classifier: ClassifierKind::Remote,
            api_token: None,
            ..Config::default()
        };

        let err = build_classifier(&config).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_remote_with_token_builds() {
        let config = Config {
            classifier: ClassifierKind::Remote,
            api_token: Some("secret".to_string()),
            ..Config::default()
        };
        let classifier = build_classifier(&config).unwrap();
        assert_eq!(classifier.kind(), ClassifierKind::Remote);
    }

    #[test]
    fn test_rule_config_builds_pipeline() {
        let pipeline = EmotionPipeline::from_config(&Config::default()).unwrap();
        assert_eq!(pipeline.classifier_kind(), ClassifierKind::Rule);
    }
}
