//! End-to-end scans over real directory trees.

use std::{fs, path::Path, time::Duration};

use finder::{Coordinator, FailurePolicy, FinderError, Order, PathSource, ScanRequest};
use futures::StreamExt;
use gsp_core::HomeDir;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn mkdirs(root: &Path, dirs: &[&str]) {
  for dir in dirs {
    fs::create_dir_all(root.join(dir)).unwrap();
  }
}

fn source(path: &Path, depth: u8) -> PathSource {
  PathSource::new(path.to_string_lossy(), depth)
}

fn abs(root: &Path, rel: &str) -> String {
  if rel.is_empty() {
    root.to_string_lossy().into_owned()
  } else {
    root.join(rel).to_string_lossy().into_owned()
  }
}

async fn scan(coordinator: &Coordinator, request: ScanRequest) -> (Vec<String>, finder::Result<finder::ScanReport>) {
  let (stream, handle) = coordinator.run(request);
  let items: Vec<String> = stream.collect().await;
  (items, handle.wait().await)
}

/// Two overlapping sources over one tree: R (depth 2) and R/A (depth 1)
fn overlapping() -> (TempDir, Vec<PathSource>) {
  let dir = TempDir::new().unwrap();
  mkdirs(dir.path(), &["A/C", "A/D", "B"]);
  fs::write(dir.path().join("A/file.txt"), "x").unwrap();
  let sources = vec![source(dir.path(), 2), source(&dir.path().join("A"), 1)];
  (dir, sources)
}

#[tokio::test]
async fn test_passthrough_yields_multiset_union() {
  let (dir, sources) = overlapping();
  let root = dir.path();

  let (mut items, report) = scan(&Coordinator::default(), ScanRequest::new(sources)).await;
  items.sort();

  let mut expected = vec![
    abs(root, ""),
    abs(root, "A"),
    abs(root, "A/C"),
    abs(root, "A/D"),
    abs(root, "B"),
    abs(root, "A"),
    abs(root, "A/C"),
    abs(root, "A/D"),
  ];
  expected.sort();
  assert_eq!(items, expected);

  let report = report.unwrap();
  assert!(report.is_complete());
  assert_eq!(report.emitted, 8);
}

#[tokio::test]
async fn test_dedupe_yields_distinct_union() {
  let (dir, sources) = overlapping();
  let root = dir.path();

  let (mut items, report) = scan(&Coordinator::default(), ScanRequest::new(sources).dedupe(true)).await;
  report.unwrap();

  let distinct = items.len();
  items.sort();
  items.dedup();
  assert_eq!(items.len(), distinct, "stream contained duplicates");
  assert_eq!(
    items,
    vec![
      abs(root, ""),
      abs(root, "A"),
      abs(root, "A/C"),
      abs(root, "A/D"),
      abs(root, "B"),
    ]
  );
}

#[tokio::test]
async fn test_ordering_is_monotone_permutation() {
  let (_dir, sources) = overlapping();
  let coordinator = Coordinator::default();

  let (mut passthrough, _) = scan(&coordinator, ScanRequest::new(sources.clone())).await;
  passthrough.sort();

  let (asc, report) = scan(&coordinator, ScanRequest::new(sources.clone()).order(Order::Ascending)).await;
  report.unwrap();
  assert!(asc.windows(2).all(|w| w[0] <= w[1]));
  assert_eq!(asc, passthrough);

  let (desc, report) = scan(&coordinator, ScanRequest::new(sources).order(Order::Descending)).await;
  report.unwrap();
  assert!(desc.windows(2).all(|w| w[0] >= w[1]));
  let mut reversed = desc.clone();
  reversed.reverse();
  assert_eq!(reversed, passthrough);
}

#[tokio::test]
async fn test_sorted_unique() {
  let (dir, sources) = overlapping();
  let root = dir.path();

  let request = ScanRequest::new(sources).dedupe(true).order(Order::Descending);
  let (items, report) = scan(&Coordinator::default(), request).await;
  report.unwrap();

  assert_eq!(
    items,
    vec![
      abs(root, "B"),
      abs(root, "A/D"),
      abs(root, "A/C"),
      abs(root, "A"),
      abs(root, ""),
    ]
  );
}

#[tokio::test]
async fn test_home_shorthand_sources_are_contracted() {
  let home_dir = TempDir::new().unwrap();
  mkdirs(home_dir.path(), &["projects/gsp", "work/api"]);
  let home = HomeDir::new(home_dir.path().to_string_lossy());

  let sources = vec![
    PathSource::new("~/projects", 1),
    PathSource::new(home_dir.path().join("work").to_string_lossy(), 1),
  ];
  let request = ScanRequest::new(sources).order(Order::Ascending);
  let (items, report) = scan(&Coordinator::new(Some(home)), request).await;
  report.unwrap();

  let root = home_dir.path();
  let mut expected = vec![
    "~/projects".to_string(),
    "~/projects/gsp".to_string(),
    abs(root, "work"),
    abs(root, "work/api"),
  ];
  expected.sort();
  assert_eq!(items, expected);
}

#[tokio::test]
async fn test_trailing_slash_source_home_shorthand() {
  let home_dir = TempDir::new().unwrap();
  mkdirs(home_dir.path(), &["projects/gsp/src"]);
  let home = HomeDir::new(home_dir.path().to_string_lossy());

  let request = ScanRequest::new(vec![PathSource::new("~/projects/", 1)]).order(Order::Ascending);
  let (items, report) = scan(&Coordinator::new(Some(home)), request).await;
  report.unwrap();

  assert_eq!(items, vec!["~/projects".to_string(), "~/projects/gsp".to_string()]);
}

#[tokio::test]
async fn test_fail_fast_surfaces_error_through_handle() {
  let dir = TempDir::new().unwrap();
  mkdirs(dir.path(), &["A", "B"]);

  let sources = vec![source(dir.path(), 1), source(&dir.path().join("missing"), 1)];
  let (_items, report) = scan(&Coordinator::default(), ScanRequest::new(sources)).await;

  match report {
    Err(FinderError::TraversalFailed { path, .. }) => assert_eq!(path, dir.path().join("missing")),
    other => panic!("expected TraversalFailed, got {other:?}"),
  }
}

#[tokio::test]
async fn test_fail_fast_with_collator_ends_stream() {
  let dir = TempDir::new().unwrap();
  mkdirs(dir.path(), &["A"]);
  fs::write(dir.path().join("file"), "x").unwrap();

  let sources = vec![source(dir.path(), 1), source(&dir.path().join("file"), 1)];
  let request = ScanRequest::new(sources).dedupe(true).order(Order::Ascending);
  let (_items, report) = tokio::time::timeout(Duration::from_secs(10), scan(&Coordinator::default(), request))
    .await
    .unwrap();

  assert!(matches!(report, Err(FinderError::NotADirectory { .. })));
}

#[tokio::test]
async fn test_best_effort_reports_failures_and_keeps_going() {
  let dir = TempDir::new().unwrap();
  mkdirs(dir.path(), &["good/A", "good/B"]);
  fs::write(dir.path().join("file"), "x").unwrap();

  let missing = dir.path().join("missing");
  let file = dir.path().join("file");
  let sources = vec![source(&missing, 1), source(&dir.path().join("good"), 1), source(&file, 1)];
  let request = ScanRequest::new(sources)
    .order(Order::Ascending)
    .on_error(FailurePolicy::BestEffort);

  let (items, report) = scan(&Coordinator::default(), request).await;
  assert_eq!(
    items,
    vec![abs(dir.path(), "good"), abs(dir.path(), "good/A"), abs(dir.path(), "good/B")]
  );

  let report = report.unwrap();
  assert!(!report.is_complete());
  assert_eq!(report.sources, 3);
  assert_eq!(report.completed, 1);

  let mut failed: Vec<&str> = report.failures.iter().map(|f| f.root.as_str()).collect();
  failed.sort();
  let mut expected = vec![missing.to_str().unwrap(), file.to_str().unwrap()];
  expected.sort();
  assert_eq!(failed, expected);
}

#[tokio::test]
async fn test_depth_zero_file_source_is_not_a_failure() {
  let dir = TempDir::new().unwrap();
  fs::write(dir.path().join("file"), "x").unwrap();

  let (items, report) = scan(&Coordinator::default(), ScanRequest::new(vec![source(&dir.path().join("file"), 0)])).await;
  assert!(items.is_empty());
  assert!(report.unwrap().is_complete());
}

/// Wide enough that every worker blocks on the shared channel
fn wide_tree() -> TempDir {
  let dir = TempDir::new().unwrap();
  for i in 0..50 {
    for j in 0..10 {
      fs::create_dir_all(dir.path().join(format!("d{i:02}/e{j:02}"))).unwrap();
    }
  }
  dir
}

#[tokio::test]
async fn test_dropping_stream_releases_sources() {
  let dir = wide_tree();
  let sources = vec![source(dir.path(), 2), source(dir.path(), 2)];

  let (mut stream, handle) = Coordinator::default().run(ScanRequest::new(sources));
  assert!(stream.next().await.is_some());
  drop(stream);

  let report = tokio::time::timeout(Duration::from_secs(10), handle.wait())
    .await
    .expect("sources did not stop after the stream was dropped")
    .unwrap();
  assert_eq!(report.completed, 2);
  assert!(report.emitted < 2 * 551);
}

#[tokio::test]
async fn test_dropping_collated_stream_releases_sources() {
  let dir = wide_tree();
  let sources = vec![source(dir.path(), 2), source(dir.path(), 2)];
  let request = ScanRequest::new(sources).dedupe(true).order(Order::Ascending);

  let (mut stream, handle) = Coordinator::default().run(request);
  assert_eq!(stream.next().await, Some(abs(dir.path(), "")));
  drop(stream);

  let report = tokio::time::timeout(Duration::from_secs(10), handle.wait())
    .await
    .expect("sources did not stop after the stream was dropped")
    .unwrap();
  assert_eq!(report.completed, 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_sibling_counts_one_level() {
  let dir = TempDir::new().unwrap();
  let base = dir.path().join("base");
  mkdirs(&base, &["depth1/depth2/depth3"]);
  std::os::unix::fs::symlink(base.join("depth1/depth2"), base.join("depth1/link")).unwrap();

  let request = ScanRequest::new(vec![source(&base, 3)]).order(Order::Ascending);
  let (items, report) = scan(&Coordinator::default(), request).await;
  report.unwrap();

  assert_eq!(
    items,
    vec![
      abs(&base, ""),
      abs(&base, "depth1"),
      abs(&base, "depth1/depth2"),
      abs(&base, "depth1/depth2/depth3"),
      abs(&base, "depth1/link"),
      abs(&base, "depth1/link/depth3"),
    ]
  );
}
