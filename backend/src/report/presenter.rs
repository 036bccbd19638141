//! Text reports returned to the user.
//!
//! Every renderer here is a pure function of its input so that the same job
//! always produces byte-identical text.

use shared::MediaKind;

use crate::collaborators::Detection;
use crate::ensemble::orchestrator::DetectionVerdict;
use crate::ensemble::weights::ModelWeightMap;

pub const BAR_WIDTH: usize = 20;
const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceTier::High
        } else if confidence >= 0.6 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(self, is_deepfake: bool) -> &'static str {
        match (is_deepfake, self) {
            (true, ConfidenceTier::High) => "🔴 **HIGH RISK**",
            (true, ConfidenceTier::Medium) => "🟡 **MEDIUM RISK**",
            (true, ConfidenceTier::Low) => "🟠 **LOW RISK**",
            (false, ConfidenceTier::High) => "🟢 **VERY CONFIDENT**",
            (false, ConfidenceTier::Medium) => "🟡 **CONFIDENT**",
            (false, ConfidenceTier::Low) => "🟠 **UNCERTAIN**",
        }
    }
}

/// Everything the deepfake report is rendered from.
#[derive(Debug, Clone)]
pub struct DeepfakeReport<'a> {
    pub file_name: &'a str,
    pub media_kind: MediaKind,
    pub requested_models: &'a [String],
    pub weights: &'a ModelWeightMap,
    pub verdict: DetectionVerdict,
    pub confidence_threshold: f64,
    /// Only set for video.
    pub frames_analyzed: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultPresenter {
    bar_width: usize,
}

impl Default for ResultPresenter {
    fn default() -> Self {
        Self {
            bar_width: BAR_WIDTH,
        }
    }
}

impl ResultPresenter {
    #[cfg(test)]
    pub fn new(bar_width: usize) -> Self {
        Self { bar_width }
    }

    /// `[████░░…] 42.0%`, with the fill rounded down to whole cells.
    pub fn confidence_bar(&self, confidence: f64) -> String {
        let confidence = confidence.clamp(0.0, 1.0);
        let filled = ((confidence * self.bar_width as f64) as usize).min(self.bar_width);
        let bar: String = std::iter::repeat_n(BAR_FILLED, filled)
            .chain(std::iter::repeat_n(BAR_EMPTY, self.bar_width - filled))
            .collect();
        format!("[{}] {}", bar, percent(confidence))
    }

    pub fn render_deepfake(&self, report: &DeepfakeReport<'_>) -> String {
        let verdict = report.verdict;
        let kind = report.media_kind.to_string();
        let (icon, status) = if verdict.is_deepfake {
            ("🚨", "DEEPFAKE")
        } else {
            ("✅", "AUTHENTIC")
        };
        let tier_heading = if verdict.is_deepfake {
            "Risk Level"
        } else {
            "Confidence Level"
        };
        let tier = ConfidenceTier::from_confidence(verdict.effective_confidence);
        let pipeline_models: Vec<&str> = report.weights.models().collect();

        let mut text = format!("# 🎬 **{} Analysis Results**\n\n", kind);

        text.push_str("## 📊 **Summary**\n");
        text.push_str(&format!("- **File**: `{}`\n", report.file_name));
        text.push_str(&format!("- **Media Type**: {}\n", kind));
        text.push_str(&format!(
            "- **Models Used**: {}\n",
            report.requested_models.join(", ")
        ));
        text.push_str(&format!(
            "- **Confidence Threshold**: {}\n",
            percent(report.confidence_threshold)
        ));

        text.push_str("\n---\n\n## 🎯 **Overall Verdict**\n");
        text.push_str(&format!("### {} **{}**\n\n", icon, status));
        text.push_str(&format!(
            "**Pipeline Result**: {}\n\n",
            self.confidence_bar(verdict.effective_confidence)
        ));
        text.push_str(&format!(
            "**{}**: {}\n",
            tier_heading,
            tier.label(verdict.is_deepfake)
        ));

        text.push_str("\n---\n\n## 🔍 **Technical Details**\n");
        text.push_str(&format!(
            "- **Pipeline Models**: {}\n",
            pipeline_models.join(", ")
        ));
        text.push_str(&format!("- **Model Weights**: {}\n", report.weights));
        text.push_str("- **Detection Algorithm**: Weighted Ensemble Pipeline\n");
        if let Some(frames) = report.frames_analyzed {
            text.push_str(&format!("- **Frames Analyzed**: {}\n", frames));
        }

        text.push_str("\n---\n\n## 💡 **Recommendation**\n");
        if verdict.is_deepfake {
            text.push_str(
                "⚠️ **This media shows strong indicators of being a deepfake.** \
                 Exercise caution when sharing or believing its content.\n",
            );
        } else {
            text.push_str(
                "✅ **This media appears to be authentic.** \
                 However, always verify content from multiple sources.\n",
            );
        }

        text.push_str("\n---\n\n## ℹ️ **About This Analysis**\n");
        text.push_str(&format!(
            "This analysis uses multiple AI models in an ensemble pipeline to detect potential \
             deepfakes. The pipeline combines predictions from {} model(s) with weighted averaging. \
             No detection system is perfect; verify important content through multiple sources.\n",
            report.weights.len()
        ));

        text
    }

    pub fn render_faces(&self, detections: &[Detection]) -> String {
        let mut text = format!("Found {} face(s)\n\n", detections.len());
        for (i, detection) in detections.iter().enumerate() {
            let bbox = detection.bbox;
            text.push_str(&format!("Face {}:\n", i + 1));
            text.push_str(&format!("  Confidence: {:.3}\n", detection.confidence));
            text.push_str(&format!(
                "  Bounding Box: ({}, {}, {}, {})\n\n",
                bbox.x1, bbox.y1, bbox.x2, bbox.y2
            ));
        }
        text
    }
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::BoundingBox;
    use crate::ensemble::weights::{ModelRegistry, RegisteredModel, normalize_weights};

    fn weights(models: &[&str]) -> ModelWeightMap {
        let registry = ModelRegistry::new(vec![
            RegisteredModel::new("resnet_inception", 0.5),
            RegisteredModel::new("efficientnet", 0.5),
        ])
        .unwrap();
        normalize_weights(models, &registry).unwrap()
    }

    fn render(is_deepfake: bool, threshold: f64, kind: MediaKind, frames: Option<u32>) -> String {
        let requested = vec!["resnet_inception".to_string(), "efficientnet".to_string()];
        let weights = weights(&["resnet_inception", "efficientnet"]);
        ResultPresenter::default().render_deepfake(&DeepfakeReport {
            file_name: "suspect.mp4",
            media_kind: kind,
            requested_models: &requested,
            weights: &weights,
            verdict: DetectionVerdict::from_threshold(is_deepfake, threshold),
            confidence_threshold: threshold,
            frames_analyzed: frames,
        })
    }

    #[test]
    fn identical_inputs_render_identical_text() {
        let first = render(true, 0.65, MediaKind::Video, Some(11));
        let second = render(true, 0.65, MediaKind::Video, Some(11));
        assert_eq!(first, second);
    }

    #[test]
    fn confidence_bar_fills_proportionally() {
        let presenter = ResultPresenter::default();
        assert_eq!(presenter.confidence_bar(0.5), "[██████████░░░░░░░░░░] 50.0%");
        assert_eq!(presenter.confidence_bar(0.0), "[░░░░░░░░░░░░░░░░░░░░] 0.0%");
        assert_eq!(presenter.confidence_bar(1.0), "[████████████████████] 100.0%");
        assert_eq!(presenter.confidence_bar(0.84), "[████████████████░░░░] 84.0%");
        assert_eq!(ResultPresenter::new(4).confidence_bar(0.5), "[██░░] 50.0%");
    }

    #[test]
    fn tiers_use_fixed_thresholds() {
        assert_eq!(ConfidenceTier::from_confidence(0.8), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.79), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.6), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.59), ConfidenceTier::Low);
        assert_ne!(
            ConfidenceTier::High.label(true),
            ConfidenceTier::High.label(false)
        );
    }

    #[test]
    fn deepfake_at_high_threshold_is_high_risk() {
        let text = render(true, 0.8, MediaKind::Image, None);
        assert!(text.contains("### 🚨 **DEEPFAKE**"));
        assert!(text.contains("**Pipeline Result**: [████████████████░░░░] 80.0%"));
        assert!(text.contains("**Risk Level**: 🔴 **HIGH RISK**"));
        assert!(text.contains("80.0%\n\n**Risk Level**"));
        assert!(text.contains("strong indicators of being a deepfake"));
    }

    #[test]
    fn authentic_verdict_uses_confidence_labels() {
        let text = render(false, 0.3, MediaKind::Image, None);
        assert!(text.contains("### ✅ **AUTHENTIC**"));
        assert!(text.contains("**Confidence Level**: 🟡 **CONFIDENT**"));
        assert!(text.contains("appears to be authentic"));
    }

    #[test]
    fn summary_lists_models_and_weights() {
        let text = render(false, 0.5, MediaKind::Image, None);
        assert!(text.starts_with("# 🎬 **Image Analysis Results**\n"));
        assert!(text.contains("- **File**: `suspect.mp4`\n"));
        assert!(text.contains("- **Models Used**: resnet_inception, efficientnet\n"));
        assert!(text.contains("- **Confidence Threshold**: 50.0%\n"));
        assert!(text.contains(
            "- **Model Weights**: resnet_inception=0.5000, efficientnet=0.5000\n"
        ));
        assert!(text.contains("predictions from 2 model(s)"));
        assert!(!text.contains("Frames Analyzed"));
    }

    #[test]
    fn video_report_mentions_frames() {
        let text = render(false, 0.5, MediaKind::Video, Some(24));
        assert!(text.starts_with("# 🎬 **Video Analysis Results**\n"));
        assert!(text.contains("- **Frames Analyzed**: 24\n"));
    }

    #[test]
    fn face_report_lists_every_detection() {
        let detections = vec![
            Detection {
                bbox: BoundingBox { x1: 10.0, y1: 20.0, x2: 110.0, y2: 140.0 },
                confidence: 0.98765,
            },
            Detection {
                bbox: BoundingBox { x1: 200.5, y1: 30.0, x2: 260.0, y2: 90.0 },
                confidence: 0.5,
            },
        ];
        let text = ResultPresenter::default().render_faces(&detections);
        assert_eq!(
            text,
            "Found 2 face(s)\n\n\
             Face 1:\n  Confidence: 0.988\n  Bounding Box: (10, 20, 110, 140)\n\n\
             Face 2:\n  Confidence: 0.500\n  Bounding Box: (200.5, 30, 260, 90)\n\n"
        );
    }

    #[test]
    fn face_report_without_faces() {
        assert_eq!(ResultPresenter::default().render_faces(&[]), "Found 0 face(s)\n\n");
    }
}
