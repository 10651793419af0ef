use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use indicatif::{
    HumanBytes, HumanDuration, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle,
};
use url::Url;

#[derive(Debug, Clone, Copy)]
pub enum DownloadKind {
    Token,
    Listing,
    Comments,
    Image,
}

impl DownloadKind {
    fn label(self) -> &'static str {
        match self {
            DownloadKind::Token => "token",
            DownloadKind::Listing => "listing",
            DownloadKind::Comments => "comments",
            DownloadKind::Image => "image",
        }
    }
}

#[derive(Debug, Default)]
struct DownloadCounters {
    listing: AtomicU64,
    comments: AtomicU64,
    image: AtomicU64,
}

impl DownloadCounters {
    fn inc(&self, kind: DownloadKind) {
        let counter = match kind {
            DownloadKind::Token => return,
            DownloadKind::Listing => &self.listing,
            DownloadKind::Comments => &self.comments,
            DownloadKind::Image => &self.image,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.listing.load(Ordering::Relaxed),
            self.comments.load(Ordering::Relaxed),
            self.image.load(Ordering::Relaxed),
        )
    }
}

/// Terminal progress display. Every method is a no-op when disabled, so the
/// pipeline can report unconditionally.
pub struct Progress {
    enabled: bool,
    start: Instant,

    // UI
    mp: Option<MultiProgress>,
    stage: ProgressBar,
    posts: ProgressBar,
    downloads: ProgressBar,

    // Counters
    posts_total: AtomicU64,
    posts_done: AtomicU64,
    images_skipped: AtomicU64,

    http_done: AtomicU64,
    http_failed: AtomicU64,
    http_bytes: AtomicU64,

    done_by_kind: DownloadCounters,
    last_http_label: Mutex<String>,
}

impl Progress {
    pub fn new(enabled: bool) -> Arc<Self> {
        let start = Instant::now();
        let mut progress = Self {
            enabled,
            start,
            mp: None,
            stage: ProgressBar::hidden(),
            posts: ProgressBar::hidden(),
            downloads: ProgressBar::hidden(),
            posts_total: AtomicU64::new(0),
            posts_done: AtomicU64::new(0),
            images_skipped: AtomicU64::new(0),
            http_done: AtomicU64::new(0),
            http_failed: AtomicU64::new(0),
            http_bytes: AtomicU64::new(0),
            done_by_kind: DownloadCounters::default(),
            last_http_label: Mutex::new(String::new()),
        };
        if !enabled {
            return Arc::new(progress);
        }

        let mp = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());

        let stage = mp.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}  [{elapsed_precise}]") {
            stage.set_style(style);
        }
        stage.enable_steady_tick(Duration::from_millis(80));
        stage.set_message("starting");

        let posts = mp.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            posts.set_style(style.progress_chars("##-"));
        }
        posts.set_message("posts");

        let downloads = mp.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            downloads.set_style(style);
        }
        downloads.enable_steady_tick(Duration::from_millis(120));

        progress.mp = Some(mp);
        progress.stage = stage;
        progress.posts = posts;
        progress.downloads = downloads;
        Arc::new(progress)
    }

    pub fn set_stage(&self, msg: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.stage.set_message(msg.into());
    }

    /// Starts a new pass over `total` posts.
    pub fn set_posts_total(&self, total: usize) {
        self.posts_total.store(total as u64, Ordering::Relaxed);
        self.posts_done.store(0, Ordering::Relaxed);
        if self.enabled {
            self.posts.set_length(total as u64);
            self.posts.set_position(0);
        }
    }

    pub fn post_done(&self, id: &str) {
        self.posts_done.fetch_add(1, Ordering::Relaxed);
        if self.enabled {
            self.posts.inc(1);
            self.posts.set_message(format!("post {id}"));
        }
    }

    pub fn image_skipped(&self) {
        self.images_skipped.fetch_add(1, Ordering::Relaxed);
        self.refresh_downloads();
    }

    pub fn http_start(&self, kind: DownloadKind, url: &Url) {
        if !self.enabled {
            return;
        }
        if let Ok(mut last) = self.last_http_label.lock() {
            *last = format!("{} ({})", url, kind.label());
        }
        self.refresh_downloads();
    }

    pub fn http_ok(&self, kind: DownloadKind, url: &Url, bytes: usize) {
        self.http_done.fetch_add(1, Ordering::Relaxed);
        self.http_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.done_by_kind.inc(kind);

        if self.enabled {
            if let Ok(mut last) = self.last_http_label.lock() {
                *last = format!("{} ({}) ok {}B", url, kind.label(), bytes);
            }
            self.refresh_downloads();
        }
    }

    pub fn http_err(&self, kind: DownloadKind, url: &Url) {
        self.http_failed.fetch_add(1, Ordering::Relaxed);
        if self.enabled {
            if let Ok(mut last) = self.last_http_label.lock() {
                *last = format!("{} ({}) failed", url, kind.label());
            }
            self.refresh_downloads();
        }
    }

    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        self.refresh_downloads();
        self.stage.finish_with_message("done");
        self.posts.finish_and_clear();
        self.downloads.finish_and_clear();
        if let Some(mp) = &self.mp {
            let _ = mp.println(format!("Done in {}", HumanDuration(self.start.elapsed())));
        }
    }

    fn refresh_downloads(&self) {
        if !self.enabled {
            return;
        }

        let done = self.http_done.load(Ordering::Relaxed);
        let failed = self.http_failed.load(Ordering::Relaxed);
        let bytes = self.http_bytes.load(Ordering::Relaxed);
        let skipped = self.images_skipped.load(Ordering::Relaxed);
        let (listing, comments, image) = self.done_by_kind.snapshot();
        let posts_done = self.posts_done.load(Ordering::Relaxed);
        let posts_total = self.posts_total.load(Ordering::Relaxed);

        let last = self
            .last_http_label
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        self.downloads.set_message(format!(
            "HTTP: done {done} failed {failed} | {bytes} | listing {listing} comments {comments} img {image} (skipped {skipped}) | posts {posts_done}/{posts_total} | {last}",
            bytes = HumanBytes(bytes),
        ));
    }
}
