//! # evomsa - alignment and domain tools
//!
//! Library behind the `evomsa` command line:
//! - `model`: sequences, alignments and their column and sequence operations
//! - `residue`: gap characters, residue cleaning, name normalization
//! - `formats`: alignment parsers (FASTA, general columnar, TSeq XML) and
//!   writers (FASTA, PHYLIP, NEXUS)
//! - `domains`: hmmscan tables, domain structures, domain extraction
//! - `cli`: the `process`, `d2f` and `extract` commands

pub mod cli;
pub mod domains;
pub mod formats;
pub mod model;
pub mod residue;
