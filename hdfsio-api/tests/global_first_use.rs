//! 全局加载器测试 - 并发首次使用只初始化一次
//!
//! The loader is process-wide, so this binary holds a single test.

use hdfsio_api::{loader, HadoopFileSystem, Loader, Status};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

#[test]
fn test_concurrent_first_use_initialises_once() {
    assert!(!loader::is_initialized());

    let barrier = Barrier::new(THREADS);
    let loaders: Vec<Arc<Loader>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    loader::global()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(loader::is_initialized());
    let first = &loaders[0];
    for other in &loaders {
        assert!(Arc::ptr_eq(first, other));
        assert_eq!(other.status(), first.status());
    }

    assert!(loader::install(Loader::failed(Status::internal("late"))).is_err());
    assert!(Arc::ptr_eq(&HadoopFileSystem::new().loader(), first));
}
