#![allow(dead_code)]

use b3_core::{
    models::{AggregatedData, AggregationWindow, TradeRecord},
    ports::{Repository, TradeRepository},
};
use std::{
    collections::BTreeMap,
    io::Write as _,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tempfile::NamedTempFile;
use time::Date;

pub const HEADER: &str = "DataReferencia;CodigoInstrumento;AcaoAtualizacao;PrecoNegocio;QuantidadeNegociada;HoraFechamento;CodigoIdentificadorNegocio;TipoSessaoPregao;DataNegocio;CodigoParticipanteComprador;CodigoParticipanteVendedor";

#[derive(Debug, thiserror::Error)]
#[error("injected failure on save #{0}")]
pub struct InjectedFailure(pub usize);

/// An in-memory repository that can be told to fail or slow down.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    pub batches: Arc<Mutex<Vec<Vec<TradeRecord>>>>,
    saves: Arc<AtomicUsize>,
    fail_on: Option<usize>,
    delay: Option<Duration>,
}

impl MemoryRepository {
    /// Reject the `n`-th call to `save_batch` (1-based).
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Default::default()
        }
    }

    /// Take `delay` to save every batch.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// Also take `delay` to save every batch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn batches(&self) -> Vec<Vec<TradeRecord>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<TradeRecord> {
        self.batches().into_iter().flatten().collect()
    }
}

impl Repository for MemoryRepository {
    type Error = InjectedFailure;
}

impl TradeRepository for MemoryRepository {
    async fn save_batch(&self, batch: Vec<TradeRecord>) -> Result<(), Self::Error> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(n) {
            return Err(InjectedFailure(n));
        }
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }

    async fn aggregate(
        &self,
        instrument_code: &str,
        window: AggregationWindow,
    ) -> Result<Option<AggregatedData>, Self::Error> {
        let records: Vec<_> = self
            .records()
            .into_iter()
            .filter(|r| r.instrument_code == instrument_code && window.contains(r.trade_date))
            .collect();

        let Some(max_range_value) = records.iter().map(|r| r.negotiated_price).max() else {
            return Ok(None);
        };

        let mut daily = BTreeMap::<Date, u64>::new();
        for record in &records {
            *daily.entry(record.trade_date).or_default() += record.negotiated_quantity;
        }

        Ok(Some(AggregatedData {
            instrument_code: instrument_code.to_owned(),
            max_range_value,
            max_daily_volume: daily.into_values().max().unwrap_or_default(),
        }))
    }
}

/// A trade line in the feed's layout.
pub fn line(code: &str, price: &str, quantity: u64, date: &str) -> String {
    format!("2024-05-03;{code};0;{price};{quantity};103000123;1;1;{date};1;2")
}

/// Write a header followed by `lines` to a temporary file.
pub fn trade_file<I: IntoIterator<Item = String>>(lines: I) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}
