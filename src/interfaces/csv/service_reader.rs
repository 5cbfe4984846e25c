use crate::domain::service::{PriceBracket, ServiceCatalog, ServiceDefinition};
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    key: String,
    label: String,
    bracket: PriceBracket,
}

/// Reads a service catalog from CSV with the columns `key,label,bracket`.
///
/// `bracket` is `low` for services priced up to 1000 CZK and `high` above that.
/// Whitespace around fields is trimmed.
pub struct ServiceReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ServiceReader<R> {
    /// Creates a new `ServiceReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator over the service definitions in file order.
    pub fn services(self) -> impl Iterator<Item = Result<ServiceDefinition>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map(|record: ServiceRecord| {
                    ServiceDefinition::new(record.key, record.label, record.bracket)
                })
                .map_err(PaymentError::from)
        })
    }

    /// Reads every row and builds a catalog. Any malformed row fails the whole load.
    pub fn into_catalog(self) -> Result<ServiceCatalog> {
        let services = self.services().collect::<Result<Vec<_>>>()?;
        ServiceCatalog::new(services)
    }
}
