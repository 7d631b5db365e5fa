use crate::domain::model::Shipment;
use crate::domain::ports::ShipmentStore;
use crate::utils::error::{Result, ShippingError};
use fd_lock::RwLock;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

fn already_shipped(order_id: &str) -> ShippingError {
    ShippingError::OrderAlreadyShipped {
        order_id: order_id.to_string(),
    }
}

/// Process-local store keyed by order id. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShipmentStore {
    shipments: Arc<Mutex<HashMap<String, Shipment>>>,
}

impl InMemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.shipments.lock().await.len()
    }
}

impl ShipmentStore for InMemoryShipmentStore {
    async fn insert_for_order(&self, shipment: &Shipment) -> Result<()> {
        let mut shipments = self.shipments.lock().await;
        if shipments.contains_key(&shipment.order_id) {
            return Err(already_shipped(&shipment.order_id));
        }
        shipments.insert(shipment.order_id.clone(), shipment.clone());
        Ok(())
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<Shipment>> {
        Ok(self.shipments.lock().await.get(order_id).cloned())
    }

    async fn find_by_tracking(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        let shipments = self.shipments.lock().await;
        Ok(shipments
            .values()
            .find(|s| s.tracking_number.eq_ignore_ascii_case(tracking_number))
            .cloned())
    }
}

/// Keeps every shipment in one `shipments.json` under `base_path`.
///
/// Inserts hold an exclusive OS lock on `shipments.lock` for the whole
/// load-check-save step, so handles in other tasks or processes are serialized.
/// Each save writes a fresh temporary file and renames it over `shipments.json`,
/// which lets readers skip the lock.
#[derive(Debug, Clone)]
pub struct JsonFileShipmentStore {
    file_path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileShipmentStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            file_path: base_path.as_ref().join("shipments.json"),
            lock_path: base_path.as_ref().join("shipments.lock"),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn data_dir(&self) -> &Path {
        self.file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    async fn load(&self) -> Result<Vec<Shipment>> {
        match tokio::fs::read(&self.file_path).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_blocking(&self) -> Result<Vec<Shipment>> {
        match std::fs::read(&self.file_path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_blocking(&self, shipments: &[Shipment]) -> Result<()> {
        let data = serde_json::to_vec_pretty(shipments)?;

        let mut tmp = NamedTempFile::new_in(self.data_dir())?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.file_path).map_err(|e| e.error)?;

        tracing::debug!(
            "Wrote {} shipments ({} bytes) to {}",
            shipments.len(),
            data.len(),
            self.file_path.display()
        );
        Ok(())
    }

    fn insert_blocking(&self, shipment: &Shipment) -> Result<()> {
        std::fs::create_dir_all(self.data_dir())?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        let mut lock = RwLock::new(lock_file);
        // 阻塞直到取得獨佔鎖，其他行程的寫入會在此排隊
        let _guard = lock.write()?;

        let mut shipments = self.load_blocking()?;
        if shipments.iter().any(|s| s.order_id == shipment.order_id) {
            return Err(already_shipped(&shipment.order_id));
        }
        shipments.push(shipment.clone());
        self.save_blocking(&shipments)
    }
}

impl ShipmentStore for JsonFileShipmentStore {
    async fn insert_for_order(&self, shipment: &Shipment) -> Result<()> {
        let store = self.clone();
        let shipment = shipment.clone();

        tokio::task::spawn_blocking(move || store.insert_blocking(&shipment))
            .await
            .map_err(|e| ShippingError::IoError(std::io::Error::other(e)))?
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<Shipment>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|s| s.order_id == order_id))
    }

    async fn find_by_tracking(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|s| s.tracking_number.eq_ignore_ascii_case(tracking_number)))
    }
}
