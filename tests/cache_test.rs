//! Video cache capacity and recency properties.

use std::path::PathBuf;
use std::sync::Arc;

use assetforge::cache::{VideoCache, VIDEO_CACHE_CAPACITY};
use assetforge::video::VideoHandle;
use assetforge_av::SourceInfo;

fn handle(name: &str) -> Arc<VideoHandle> {
    let path = PathBuf::from(format!("/tmp/{}.mp4", name));
    Arc::new(VideoHandle {
        local_path: path.clone(),
        info: SourceInfo {
            path,
            duration: None,
            video: None,
        },
    })
}

fn url(i: usize) -> String {
    format!("https://cdn.example.com/video/{}.mp4", i)
}

#[test]
fn sixth_insert_evicts_least_recently_touched() {
    let cache = VideoCache::with_capacity(VIDEO_CACHE_CAPACITY);
    for i in 0..6 {
        cache.insert(url(i), handle(&i.to_string()));
    }

    assert_eq!(cache.len(), 5);
    assert!(cache.get(&url(0)).is_none(), "oldest entry must be evicted");
    for i in 1..6 {
        assert!(cache.get(&url(i)).is_some(), "entry {} must survive", i);
    }
}

#[test]
fn get_protects_an_entry_from_eviction() {
    let cache = VideoCache::with_capacity(VIDEO_CACHE_CAPACITY);
    for i in 0..5 {
        cache.insert(url(i), handle(&i.to_string()));
    }

    // Touching the oldest entry promotes it; the next insert must evict the
    // new least-recently-touched key instead.
    assert!(cache.get(&url(0)).is_some());
    cache.insert(url(5), handle("5"));

    assert_eq!(cache.len(), 5);
    assert!(cache.get(&url(0)).is_some());
    assert!(cache.get(&url(1)).is_none());
}

#[test]
fn reinserting_a_key_does_not_grow_the_cache() {
    let cache = VideoCache::with_capacity(VIDEO_CACHE_CAPACITY);
    for i in 0..5 {
        cache.insert(url(i), handle(&i.to_string()));
    }
    cache.insert(url(4), handle("4-again"));
    assert_eq!(cache.len(), 5);
    for i in 0..5 {
        assert!(cache.get(&url(i)).is_some());
    }
}
