use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "cellflow", version, about = "Flowing grid of glowing cells, shaded per pixel in the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: u32,

    /// Multiplier applied to wall-clock time before it reaches the shader.
    #[arg(long, default_value_t = 1.0)]
    pub speed: f32,

    /// Elapsed seconds at startup.
    #[arg(long, default_value_t = 0.0)]
    pub start: f32,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=MAX_SCALE as i64))]
    pub scale: u8,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub adaptive_scale: bool,

    /// Worker threads for the shader engine; 0 picks the available parallelism.
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    #[arg(long, value_enum, default_value_t = ClampMode::Final)]
    pub clamp: ClampMode,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

pub const MAX_SCALE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
    #[value(alias = "sext", alias = "mosaic", alias = "symbols")]
    Sextant,
}

impl RendererMode {
    /// Shader pixels per terminal cell, `(across, down)`.
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            Self::Ascii => (1, 1),
            Self::HalfBlock => (1, 2),
            Self::Braille => (2, 4),
            Self::Sextant => (2, 3),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::HalfBlock => Self::Braille,
            Self::Braille => Self::Sextant,
            Self::Sextant => Self::Ascii,
            Self::Ascii => Self::HalfBlock,
        }
    }
}

/// Where the output is confined to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClampMode {
    /// Only at output, like a display pipeline. Overdriven channels turn dark.
    Final,
    /// Also before the output curve, so overdriven channels saturate to white.
    #[value(name = "pre-curve", alias = "precurve", alias = "pre")]
    PreCurve,
}

impl ClampMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Final => Self::PreCurve,
            Self::PreCurve => Self::Final,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::PreCurve => "pre-curve",
        }
    }
}
