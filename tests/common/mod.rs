//! 测试辅助工具
//!
//! 基于 `MemoryClient` 搭建端到端测试环境，不需要真实的 libhdfs

#![allow(dead_code)]

use hdfsio_workspace::{HadoopFileSystem, Loader, MemoryClient, Status};
use std::sync::Arc;

/// Default namenode of the test cluster
pub const NAME_NODE: &str = "nn1:8020";

/// `hdfs://nn1:8020<path>`
pub fn hdfs(path: &str) -> String {
    format!("hdfs://{}{}", NAME_NODE, path)
}

/// `file://<path>`
pub fn local(path: &str) -> String {
    format!("file://{}", path)
}

/// A facade over a fresh in-memory cluster
pub struct TestCluster {
    pub client: MemoryClient,
    pub fs: HadoopFileSystem,
}

impl TestCluster {
    pub fn new() -> Self {
        let client = MemoryClient::new();
        let loader = Loader::with_client(Arc::new(client.clone()));
        Self {
            client,
            fs: HadoopFileSystem::with_loader(Arc::new(loader)),
        }
    }

    pub fn put(&self, path: &str, data: &[u8]) {
        self.client.put_file(Some(NAME_NODE), path, data);
    }

    pub fn mkdir(&self, path: &str) {
        self.client.put_dir(Some(NAME_NODE), path);
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.client.read_file(Some(NAME_NODE), path)
    }
}

/// A facade whose loader failed with `status`
pub fn failed_fs(status: Status) -> HadoopFileSystem {
    HadoopFileSystem::with_loader(Arc::new(Loader::failed(status)))
}

/// `count` records of `size` bytes, each filled with its own index
pub fn records(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| (0..size).map(|j| (i * 31 + j) as u8).collect())
        .collect()
}
