//! # Command line interface
//!
//! All configuration is given on the command line at startup and stays fixed for the whole run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;
use std::str::FromStr;

use comms_if::eqpt::det::{ClassId, OverlayFlags};
use structopt::StructOpt;
use util::logger::LevelFilter;

use crate::{
    det_source::{DetSourceError, DetectConfig},
    track_ctrl::{NoTargetMode, Params, ParamsError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Locate people in a live detection stream and steer the robot to keep the nearest one centred.
#[derive(Debug, StructOpt)]
#[structopt(
    name = "track_exec",
    setting = structopt::clap::AppSettings::AllowNegativeNumbers
)]
pub struct Opts {
    /// Path of the input detection stream
    #[structopt(parse(from_os_str))]
    pub input_uri: PathBuf,

    /// Pre-trained detection network to load
    #[structopt(long, default_value = "ssd-mobilenet-v2")]
    pub network: String,

    /// Detection overlay flags (e.g. --overlay=box,labels,conf), valid combinations are 'box',
    /// 'labels', 'conf' and 'none'
    #[structopt(long, default_value = "box,labels,conf")]
    pub overlay: OverlayFlags,

    /// Minimum detection threshold to use
    #[structopt(long, default_value = "0.5")]
    pub threshold: f64,

    /// Proportional gain for the tracking controller
    #[structopt(long, default_value = "0.1")]
    pub kp: f64,

    /// Derivative gain for the tracking controller
    #[structopt(long, default_value = "0.01")]
    pub kd: f64,

    /// Maximum wheel speed
    #[structopt(long, default_value = "0.8")]
    pub maxspeed: f64,

    /// Minimum wheel speed
    #[structopt(long, default_value = "0.2")]
    pub minspeed: f64,

    /// Sampling period of the controller (ms)
    #[structopt(long, default_value = "500")]
    pub dt: f64,

    /// Class ID of the objects to track
    #[structopt(long, default_value = "1")]
    pub track_class: u32,

    /// Behaviour when no target is found: 'stop', 'hold' or 'search'
    #[structopt(long, default_value = "stop")]
    pub no_target: NoTargetMode,

    /// Motors to drive: 'sim' or 'hat'
    #[structopt(long, default_value = "sim")]
    pub motors: MotorKind,

    /// Minimum level of messages to log, at least 'info'
    #[structopt(long, default_value = "info")]
    pub log_level: LevelFilter,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motors the executable can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorKind {
    /// Simulated motors, commands are only logged
    Sim,

    /// Adafruit Motor HAT on the host's I2C bus
    Hat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid controller parameters: {0}")]
    Ctrl(#[from] ParamsError),

    #[error("Invalid detection parameters: {0}")]
    Detect(#[from] DetSourceError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Opts {
    /// Tracking controller parameters.
    pub fn ctrl_params(&self) -> Params {
        Params {
            k_p: self.kp,
            k_d: self.kd,
            period_ms: self.dt,
            min_speed: self.minspeed,
            max_speed: self.maxspeed,
            track_class: ClassId(self.track_class),
            no_target_mode: self.no_target,
        }
    }

    /// Detection network configuration.
    pub fn detect_config(&self) -> DetectConfig {
        DetectConfig {
            network: self.network.clone(),
            threshold: self.threshold,
            overlay: self.overlay,
        }
    }

    /// Check the whole configuration before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ctrl_params().validate()?;
        self.detect_config().validate()?;

        Ok(())
    }
}

impl FromStr for MotorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sim" => Ok(MotorKind::Sim),
            "hat" => Ok(MotorKind::Hat),
            _ => Err(format!("Unknown motors \"{}\", expected 'sim' or 'hat'", s)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opts, structopt::clap::Error> {
        Opts::from_iter_safe(std::iter::once("track_exec").chain(args.iter().cloned()))
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["stream.jsonl"]).unwrap();

        assert_eq!(opts.input_uri, PathBuf::from("stream.jsonl"));
        assert_eq!(opts.ctrl_params(), Params::default());
        assert_eq!(opts.detect_config(), DetectConfig::default());
        assert_eq!(opts.motors, MotorKind::Sim);
        assert_eq!(opts.log_level, LevelFilter::Info);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let opts = parse(&[
            "stream.jsonl",
            "--kp", "0.002",
            "--kd", "0.0005",
            "--dt", "100",
            "--minspeed", "0.1",
            "--maxspeed", "0.6",
            "--overlay", "box",
            "--threshold", "0.7",
            "--no-target", "search",
            "--track-class", "3",
            "--motors", "hat",
        ])
        .unwrap();

        let p = opts.ctrl_params();
        assert_eq!(p.k_p, 0.002);
        assert_eq!(p.k_d, 0.0005);
        assert_eq!(p.period_ms, 100.0);
        assert_eq!((p.min_speed, p.max_speed), (0.1, 0.6));
        assert_eq!(p.track_class, ClassId(3));
        assert_eq!(p.no_target_mode, NoTargetMode::Search);

        let d = opts.detect_config();
        assert_eq!(d.threshold, 0.7);
        assert!(d.overlay.bbox && !d.overlay.labels && !d.overlay.conf);

        assert_eq!(opts.motors, MotorKind::Hat);
    }

    #[test]
    fn test_negative_values() {
        let opts = parse(&[
            "stream.jsonl",
            "--kp", "-0.002",
            "--kd", "-0.01",
            "--minspeed", "-0.5",
            "--maxspeed", "0.5",
        ])
        .unwrap();

        let p = opts.ctrl_params();
        assert_eq!(p.k_p, -0.002);
        assert_eq!(p.k_d, -0.01);
        assert_eq!((p.min_speed, p.max_speed), (-0.5, 0.5));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let opts = parse(&["stream.jsonl", "--minspeed", "0.9", "--maxspeed", "0.5"]).unwrap();
        match opts.validate() {
            Err(ConfigError::Ctrl(ParamsError::InvalidSpeedRange { .. })) => (),
            r => panic!("Expected invalid speed range, got {:?}", r),
        }

        let opts = parse(&["stream.jsonl", "--dt", "0"]).unwrap();
        match opts.validate() {
            Err(ConfigError::Ctrl(ParamsError::InvalidPeriod(_))) => (),
            r => panic!("Expected invalid period, got {:?}", r),
        }

        let opts = parse(&["stream.jsonl", "--threshold", "1.5"]).unwrap();
        match opts.validate() {
            Err(ConfigError::Detect(DetSourceError::InvalidThreshold(_))) => (),
            r => panic!("Expected invalid threshold, got {:?}", r),
        }

        assert!(parse(&["stream.jsonl", "--overlay", "outline"]).is_err());
        assert!(parse(&["stream.jsonl", "--no-target", "spin"]).is_err());
        assert!(parse(&["stream.jsonl", "--motors", "servo"]).is_err());
        assert!(parse(&[]).is_err());
    }
}
