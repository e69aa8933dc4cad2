//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use rust_nmf::{Encoding, ModelConfig, TopicModel};

/// Build topic models with non-negative matrix factorization
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory with the files to process (searched recursively)
    #[arg(long)]
    files: PathBuf,

    /// Encoding of the input files (utf8, ascii, latin1)
    #[arg(long, default_value = "utf8")]
    encoding: Encoding,

    /// Maximum number of files to process
    #[arg(long)]
    max_files: Option<usize>,

    /// Number of topics to model
    #[arg(long, default_value_t = 20)]
    topics: usize,

    /// Maximum number of factorization iterations
    #[arg(long, default_value_t = 100)]
    iters: usize,

    /// Number of words to report per topic
    #[arg(long, default_value_t = 10)]
    words: usize,

    /// Keep terms found in at least this many documents
    #[arg(long, default_value_t = 2)]
    min_count: usize,

    /// Drop terms found in more than this share of documents
    #[arg(long, default_value_t = 0.95)]
    max_freq: f64,

    /// Seed for the factor initialization
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Directory the JSON results are written to
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Do not write doc_to_topics.json and topic_to_words.json
    #[arg(long = "no-write-output", action = ArgAction::SetFalse)]
    write_output: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ModelConfig::new()
        .encoding(args.encoding)
        .max_files(args.max_files)
        .topics(args.topics)
        .iterations(args.iters)
        .words(args.words)
        .min_count(args.min_count)
        .max_freq(args.max_freq)
        .seed(args.seed)
        .output_dir(args.output_dir)
        .write_output(args.write_output);

    let model = TopicModel::fit(&args.files, &config)
        .with_context(|| format!("failed to build a topic model from {}", args.files.display()))?;

    println!("topics!");
    for (topic, words) in model.topic_to_words() {
        println!("\t{}: {}", topic, words.join(" "));
    }

    Ok(())
}
