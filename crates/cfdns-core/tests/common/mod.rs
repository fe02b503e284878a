//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record how the core
//! talks to its collaborators without performing any network I/O.

#![allow(dead_code)]

use cfdns_core::error::{Error, Result};
use cfdns_core::traits::{DnsRecord, DnsRegistrar, IpSource};
use cfdns_core::{Reconciler, UpdateEngine, UpdateMetrics};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ZONE: &str = "example.com";
pub const HOST: &str = "home.example.com";
pub const ZONE_ID: &str = "zone-123";

/// An IP source that always answers with the same address
pub struct StaticIpSource {
    ip: String,
    resolve_call_count: AtomicUsize,
}

impl StaticIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            resolve_call_count: AtomicUsize::new(0),
        }
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn resolve(&self) -> Result<String> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IP source that always fails like an unavailable discovery service
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn resolve(&self) -> Result<String> {
        Err(Error::http_status("503 Service Unavailable"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// An IP source that blocks until told to answer
pub struct GatedIpSource {
    ip: String,
    gate: tokio::sync::Notify,
}

impl GatedIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            gate: tokio::sync::Notify::new(),
        }
    }

    /// Let one pending resolve() return
    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait::async_trait]
impl IpSource for GatedIpSource {
    async fn resolve(&self) -> Result<String> {
        self.gate.notified().await;
        Ok(self.ip.clone())
    }

    fn source_name(&self) -> &'static str {
        "gated"
    }
}

/// An in-memory registrar that tracks calls
pub struct MockRegistrar {
    records: Mutex<Vec<DnsRecord>>,
    zone_call_count: AtomicUsize,
    list_call_count: AtomicUsize,
    create_call_count: AtomicUsize,
    update_call_count: AtomicUsize,
    /// Arguments of create_record() calls: (name, type, content)
    created: Mutex<Vec<(String, String, String)>>,
    /// Arguments of update_record_content() calls: (record id, content)
    updated: Mutex<Vec<(String, String)>>,
    fail_writes: bool,
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            zone_call_count: AtomicUsize::new(0),
            list_call_count: AtomicUsize::new(0),
            create_call_count: AtomicUsize::new(0),
            update_call_count: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            fail_writes: false,
        }
    }

    /// Make every create/update call fail
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn zone_call_count(&self) -> usize {
        self.zone_call_count.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    pub fn write_call_count(&self) -> usize {
        self.create_call_count() + self.update_call_count()
    }

    /// Total number of registrar calls of any kind
    pub fn total_call_count(&self) -> usize {
        self.zone_call_count() + self.list_call_count() + self.write_call_count()
    }

    pub fn created(&self) -> Vec<(String, String, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, String)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsRegistrar for MockRegistrar {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        self.zone_call_count.fetch_add(1, Ordering::SeqCst);
        if zone_name == ZONE {
            Ok(ZONE_ID.to_string())
        } else {
            Err(Error::not_found(format!("Zone not found: {zone_name}")))
        }
    }

    async fn list_records(
        &self,
        _zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name && r.record_type == record_type)
            .cloned()
            .collect())
    }

    async fn create_record(
        &self,
        _zone_id: &str,
        name: &str,
        record_type: &str,
        content: &str,
    ) -> Result<DnsRecord> {
        self.create_call_count.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push((
            name.to_string(),
            record_type.to_string(),
            content.to_string(),
        ));
        if self.fail_writes {
            return Err(Error::provider("mock", "create rejected"));
        }

        let mut records = self.records.lock().unwrap();
        let record = DnsRecord {
            id: format!("rec-{}", records.len() + 1),
            name: name.to_string(),
            record_type: record_type.to_string(),
            content: content.to_string(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update_record_content(
        &self,
        _zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<DnsRecord> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.updated
            .lock()
            .unwrap()
            .push((record_id.to_string(), content.to_string()));
        if self.fail_writes {
            return Err(Error::provider("mock", "update rejected"));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(record_id.to_string()))?;
        record.content = content.to_string();
        Ok(record.clone())
    }

    fn registrar_name(&self) -> &'static str {
        "mock"
    }
}

/// Build an A record for the managed host
pub fn a_record(id: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: HOST.to_string(),
        record_type: "A".to_string(),
        content: content.to_string(),
    }
}

pub fn metrics() -> Arc<UpdateMetrics> {
    Arc::new(UpdateMetrics::new("test", "test"))
}

pub fn reconciler(registrar: &Arc<MockRegistrar>, metrics: &Arc<UpdateMetrics>) -> Reconciler {
    Reconciler::new(registrar.clone(), ZONE, HOST, metrics.clone())
}

/// Build an engine with a short sleep interval for loop tests
pub fn engine(
    ip_source: Arc<dyn IpSource>,
    registrar: &Arc<MockRegistrar>,
    metrics: &Arc<UpdateMetrics>,
    sleep_interval: Duration,
) -> UpdateEngine {
    UpdateEngine::new(
        ip_source,
        reconciler(registrar, metrics),
        metrics.clone(),
        sleep_interval,
    )
    .expect("engine construction succeeds")
}
