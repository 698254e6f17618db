//! Uso - cluster node-usage reports from SLURM accounting data
//!
//! This library turns a batch of job accounting records into a
//! fixed-resolution node-occupancy histogram, per-category node-hour
//! summaries, and an SVG step plot of a processing campaign.

pub mod category;
pub mod cli;
pub mod datafile;
pub mod histogram;
pub mod json_output;
pub mod plot;
pub mod reconcile;
pub mod record;
pub mod sacct;
pub mod spans;
pub mod summary;
