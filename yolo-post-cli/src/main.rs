use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use yolo_post::io::scale_for_image;
use yolo_post::{
    coco_label, decode_and_suppress, Detection, KeypointKind, PipelineConfig, Pose, Predictions,
    ScaleFactors, TensorView, KEYPOINT_VISIBILITY_THRESHOLD,
};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "YOLO head post-processing (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineConfigJson {
    task: String,
    score_threshold: f32,
    iou_threshold: f32,
    max_candidates: usize,
    num_classes: usize,
    num_keypoints: usize,
    class_agnostic: bool,
    parallel: bool,
}

impl Default for PipelineConfigJson {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            task: cfg.task.to_string(),
            score_threshold: cfg.score_threshold,
            iou_threshold: cfg.iou_threshold,
            max_candidates: cfg.max_candidates,
            num_classes: cfg.num_classes,
            num_keypoints: cfg.num_keypoints,
            class_agnostic: cfg.class_agnostic,
            parallel: cfg.parallel,
        }
    }
}

impl PipelineConfigJson {
    fn to_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        Ok(PipelineConfig {
            task: self.task.parse()?,
            score_threshold: self.score_threshold,
            iou_threshold: self.iou_threshold,
            max_candidates: self.max_candidates,
            num_classes: self.num_classes,
            num_keypoints: self.num_keypoints,
            class_agnostic: self.class_agnostic,
            parallel: self.parallel,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    /// `.json` file with `shape` and `data`, or raw little-endian f32.
    tensor_path: String,
    /// Required for raw tensor files.
    tensor_shape: Option<[usize; 3]>,
    /// Source image; its header gives the source size when set.
    image_path: Option<String>,
    source_width: u32,
    source_height: u32,
    input_width: u32,
    input_height: u32,
    output_path: Option<String>,
    pipeline: PipelineConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensor_path: String::new(),
            tensor_shape: None,
            image_path: None,
            source_width: 640,
            source_height: 640,
            input_width: 640,
            input_height: 640,
            output_path: None,
            pipeline: PipelineConfigJson::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TensorFile {
    shape: [usize; 3],
    data: Vec<f32>,
}

fn load_tensor(
    path: &Path,
    shape: Option<[usize; 3]>,
) -> Result<([usize; 3], Vec<f32>), Box<dyn std::error::Error>> {
    if path.extension().is_some_and(|ext| ext == "json") {
        let tensor: TensorFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        return Ok((tensor.shape, tensor.data));
    }
    let shape = shape.ok_or("tensor_shape must be set for raw tensor files")?;
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(format!("raw tensor size {} is not a multiple of 4", bytes.len()).into());
    }
    let data = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((shape, data))
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    bbox: [f32; 4],
    class_index: usize,
    label: Option<&'static str>,
    score: f32,
}

impl From<&Detection> for DetectionRecord {
    fn from(value: &Detection) -> Self {
        Self {
            bbox: value.bbox.to_array(),
            class_index: value.class_index,
            label: coco_label(value.class_index),
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct KeypointRecord {
    name: Option<&'static str>,
    x: f32,
    y: f32,
    score: f32,
}

#[derive(Debug, Serialize)]
struct PoseRecord {
    bbox: [f32; 4],
    score: f32,
    keypoints: Vec<KeypointRecord>,
    limbs: Vec<(usize, usize)>,
}

impl From<&Pose> for PoseRecord {
    fn from(value: &Pose) -> Self {
        let keypoints = value
            .keypoints
            .iter()
            .enumerate()
            .map(|(idx, kp)| KeypointRecord {
                name: KeypointKind::from_index(idx).map(KeypointKind::name),
                x: kp.x,
                y: kp.y,
                score: kp.score,
            })
            .collect();
        Self {
            bbox: value.bbox.to_array(),
            score: value.score,
            keypoints,
            limbs: value.visible_limbs(KEYPOINT_VISIBILITY_THRESHOLD).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
enum Output {
    Detect { detections: Vec<DetectionRecord> },
    Pose { poses: Vec<PoseRecord> },
}

impl From<&Predictions> for Output {
    fn from(value: &Predictions) -> Self {
        match value {
            Predictions::Detect(items) => Output::Detect {
                detections: items.iter().map(DetectionRecord::from).collect(),
            },
            Predictions::Pose(items) => Output::Pose {
                poses: items.iter().map(PoseRecord::from).collect(),
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolo_post=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }

    let pipeline = config.pipeline.to_config()?;

    let scale = match &config.image_path {
        Some(path) => scale_for_image(path, config.input_width, config.input_height)?,
        None => ScaleFactors::from_dims(
            config.source_width,
            config.source_height,
            config.input_width,
            config.input_height,
        )?,
    };

    let (shape, data) = load_tensor(Path::new(&config.tensor_path), config.tensor_shape)?;
    let tensor = TensorView::new(&data, shape)?;
    let predictions = decode_and_suppress(tensor, scale, &pipeline)?;
    tracing::info!(task = %pipeline.task, count = predictions.len(), "decoded");

    let output = Output::from(&predictions);
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
