use anyhow::Context;
use common::LogFormat;
use preprocess::{ChannelOrder, LayoutSpec, PipelineConfig};
use std::env;

#[derive(Debug, Clone)]
pub struct DigitizeConfig {
    pub log_format: LogFormat,
    pub preset: String,
    pub layout: LayoutSpec,
}

impl DigitizeConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// `INPUT_DIMS` (e.g. `1,1,28,28`, as a model reports it) takes precedence
    /// over the individual `INPUT_LAYOUT` / `INPUT_CHANNELS` / `INPUT_HEIGHT` /
    /// `INPUT_WIDTH` settings.
    pub fn from_env() -> anyhow::Result<Self> {
        let log_format = LogFormat::from_env();

        let preset = env::var("PREPROCESS_PRESET").unwrap_or_else(|_| "canvas".to_string());

        let layout = match env::var("INPUT_DIMS") {
            Ok(dims) => LayoutSpec::from_input_dims(&parse_dims(&dims)?)?,
            Err(_) => {
                let order = env::var("INPUT_LAYOUT")
                    .map(|v| ChannelOrder::parse(&v))
                    .unwrap_or(Ok(ChannelOrder::ChannelsFirst))?;
                let channels = parse_var("INPUT_CHANNELS", 1)?;
                let height = parse_var("INPUT_HEIGHT", 28)?;
                let width = parse_var("INPUT_WIDTH", 28)?;
                LayoutSpec::new(channels, height, width, order)?
            }
        };

        Ok(Self {
            log_format,
            preset,
            layout,
        })
    }

    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        Ok(PipelineConfig::preset(&self.preset, self.layout)?)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid value for {}", value, name)),
        Err(_) => Ok(default),
    }
}

/// Parse `1,3,?,224` style dimensions; `?` and blanks are symbolic.
fn parse_dims(value: &str) -> anyhow::Result<Vec<i64>> {
    value
        .split(',')
        .map(|d| match d.trim() {
            "" | "?" => Ok(-1),
            n => n
                .parse::<i64>()
                .with_context(|| format!("{} is not a valid input dimension", n)),
        })
        .collect()
}
