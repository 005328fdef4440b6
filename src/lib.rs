pub mod annotate;
pub mod annotations;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod fasta;
pub mod metadata;
pub mod output;
pub mod template;
pub mod tip_dates;
