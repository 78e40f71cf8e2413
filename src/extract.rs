use crate::classify::PageClassifier;
use crate::config::{COUNTERS_FILE, DEFAULT_SPLIT_SIZE, PROGRESS_INTERVAL, READ_BUFFER_SIZE, WRITE_BUFFER_SIZE};
use crate::content;
use crate::error::PageError;
use crate::language;
use crate::models::{plan_splits, ContentFormat, PageType, RawPageFragment, SplitRange};
use crate::splitter::{open_split, PageSplitter};
use crate::stats::{CounterSnapshot, PageCounters};
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use csv::{QuoteStyle, Writer, WriterBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parameters shared by both pipelines.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub language: Option<String>,
    pub content_format: ContentFormat,
    pub split_size: u64,
    pub threads: Option<usize>,
    pub limit: Option<u64>,
    pub dry_run: bool,
}

impl JobConfig {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            language: None,
            content_format: ContentFormat::default(),
            split_size: DEFAULT_SPLIT_SIZE,
            threads: None,
            limit: None,
            dry_run: false,
        }
    }
}

/// What a job emits for each classified page.
#[derive(Debug, Clone, Copy)]
enum Pipeline {
    PlainText(ContentFormat),
    Redirects,
}

type PartWriter = Writer<BufWriter<File>>;

fn part_writer(output_dir: &Path, split_index: usize) -> Result<PartWriter> {
    let path = output_dir.join(format!("part-{:05}", split_index));
    let file = File::create(&path).with_context(|| format!("Failed to create output file: {:?}", path))?;
    Ok(WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .has_headers(false)
        .from_writer(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)))
}

/// Emits every article as `id \t rendered-content`.
pub fn run_plain_text(config: &JobConfig) -> Result<CounterSnapshot> {
    run_job(config, Pipeline::PlainText(config.content_format))
}

/// Emits every redirect as `title \t target`.
pub fn run_redirects(config: &JobConfig) -> Result<CounterSnapshot> {
    run_job(config, Pipeline::Redirects)
}

fn is_bz2(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "bz2")
}

fn run_job(config: &JobConfig, pipeline: Pipeline) -> Result<CounterSnapshot> {
    let classifier = PageClassifier::new(language::table_for(config.language.as_deref()));
    let counters = PageCounters::new();

    info!(
        input = %config.input.display(),
        output = %config.output_dir.display(),
        language = classifier.table().code(),
        pipeline = ?pipeline,
        dry_run = config.dry_run,
        "Starting job"
    );

    if !config.dry_run {
        if config.output_dir.exists() {
            fs::remove_dir_all(&config.output_dir).with_context(|| {
                format!("Failed to clean output directory: {:?}", config.output_dir)
            })?;
        }
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", config.output_dir)
        })?;
    }

    let worker = SplitWorker {
        classifier,
        counters: &counters,
        pipeline,
        output_dir: &config.output_dir,
        limit: config.limit,
        dry_run: config.dry_run,
    };

    if is_bz2(&config.input) {
        let file = File::open(&config.input)
            .with_context(|| format!("Failed to open wiki dump at: {:?}", config.input))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, MultiBzDecoder::new(file));
        let pb = make_spinner("Processing compressed dump (single split)");
        worker.process(0, PageSplitter::whole(reader), &pb)?;
        pb.finish_and_clear();
    } else {
        let len = fs::metadata(&config.input)
            .with_context(|| format!("Failed to get metadata for: {:?}", config.input))?
            .len();
        let splits = plan_splits(len, config.split_size);
        info!(bytes = len, splits = splits.len(), "Planned splits");

        let pool = {
            let mut builder =
                rayon::ThreadPoolBuilder::new().thread_name(|i| format!("wikicorpus-split-{i}"));
            if let Some(threads) = config.threads {
                builder = builder.num_threads(threads);
            }
            builder.build().context("Failed to build worker pool")?
        };

        let pb = make_progress_bar(len);
        pool.install(|| {
            splits
                .par_iter()
                .enumerate()
                .try_for_each(|(index, range)| -> Result<()> {
                    let splitter = open_split(&config.input, *range)
                        .with_context(|| format!("Failed to open split {index} of {:?}", config.input))?;
                    worker.process(index, splitter, &pb)?;
                    pb.inc(range.len());
                    Ok(())
                })
        })?;
        pb.finish_and_clear();
    }

    let snapshot = counters.snapshot();
    if !config.dry_run {
        write_counters(&config.output_dir, &snapshot)?;
    }

    info!(
        total = snapshot.total,
        articles = snapshot.article,
        redirects = snapshot.redirect,
        malformed = snapshot.malformed,
        "Job complete"
    );
    Ok(snapshot)
}

fn write_counters(output_dir: &Path, snapshot: &CounterSnapshot) -> Result<()> {
    let path = output_dir.join(COUNTERS_FILE);
    let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot).context("Failed to write counters")?;
    writer.flush().context("Failed to write counters")?;
    Ok(())
}

/// State shared by every split of one job. Holds no mutable state besides the
/// atomic counters.
struct SplitWorker<'a> {
    classifier: PageClassifier,
    counters: &'a PageCounters,
    pipeline: Pipeline,
    output_dir: &'a Path,
    limit: Option<u64>,
    dry_run: bool,
}

impl SplitWorker<'_> {
    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.counters.total() >= limit)
    }

    fn process<R: BufRead>(&self, index: usize, splitter: PageSplitter<R>, pb: &ProgressBar) -> Result<()> {
        let range: SplitRange = splitter.range();
        let mut writer = if self.dry_run {
            None
        } else {
            Some(part_writer(self.output_dir, index)?)
        };
        let mut pages: u64 = 0;

        for fragment in splitter {
            if self.limit_reached() {
                debug!(split = index, "Page limit reached, stopping split");
                break;
            }
            let fragment = fragment.with_context(|| format!("Failed to read split {index}"))?;
            self.handle(&fragment, writer.as_mut())?;
            pages += 1;
            if pages % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }
        }

        if let Some(mut writer) = writer {
            writer.flush().with_context(|| format!("Failed to flush output for split {index}"))?;
        }
        debug!(split = index, start = range.start, end = range.end, pages, "Split finished");
        Ok(())
    }

    fn handle(&self, fragment: &RawPageFragment, writer: Option<&mut PartWriter>) -> Result<()> {
        let result = self.classifier.classify_fragment(fragment);
        self.counters.record(&result);

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                debug!(error = %e, "Skipping page");
                return Ok(());
            }
        };

        match (self.pipeline, page.page_type) {
            (Pipeline::PlainText(format), PageType::Article { .. }) => {
                let value = content::render(&page, format);
                if let Some(writer) = writer {
                    writer.write_record([page.id, value.as_str()])?;
                }
            }
            (Pipeline::Redirects, PageType::Redirect) => match page.redirect_target() {
                Some(target) => {
                    if let Some(writer) = writer {
                        writer.write_record([page.title.as_str(), target.as_str()])?;
                    }
                }
                None => {
                    self.counters.inc_redirect_target_missing();
                    let miss = PageError::RedirectTargetMissing { title: page.title.clone() };
                    warn!(error = %miss, offset = fragment.start, "Redirect target not recoverable");
                }
            },
            _ => {}
        }
        Ok(())
    }
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

fn make_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
