//! Place storage in a Fedora Commons repository over its REST API.
//!
//! # Responsibility
//! - Implement [`RecordStorage`] for `place`: read, create, update, soft
//!   delete and list.
//! - Convert between repository XML and records through the converter
//!   factory.
//!
//! # Invariants
//! - A place exists only when an active-state search lists its pid and
//!   the following fetch does not answer 404.
//! - Write requests carry HTTP Basic credentials; reads and searches do not.
//! - No call is retried and partially created objects are never removed.
//!
//! # See also
//! - docs/architecture/logging.md

use crate::config::FedoraConfig;
use crate::convert::{AlvinFedoraConverterFactory, FedoraConverterFactory};
use crate::http::{basic_authorization, HttpClient, HttpRequest, HttpResponse};
use crate::model::collected_terms::record_label;
use crate::model::record::DataGroup;
use crate::storage::{RecordStorage, StorageError, StorageReadResult, StorageResult};
use crate::xml::XPathDocument;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

pub mod create;
pub mod urls;

pub use create::{CreateError, CreateState, CreateStep, PlaceCreation, StepFailure};

const PLACE_TYPE: &str = "place";
const SEARCH_RESULT_PIDS: &str = "/*[local-name()='result']/*[local-name()='resultList']\
    /*[local-name()='objectFields']/*[local-name()='pid']/text()";
const OK: u16 = 200;
const NOT_FOUND: u16 = 404;

pub struct FedoraRecordStorage {
    config: FedoraConfig,
    http: Arc<dyn HttpClient>,
    converter_factory: Box<dyn FedoraConverterFactory>,
}

impl FedoraRecordStorage {
    pub fn new(
        config: FedoraConfig,
        http: Arc<dyn HttpClient>,
        converter_factory: Box<dyn FedoraConverterFactory>,
    ) -> Self {
        Self {
            config,
            http,
            converter_factory,
        }
    }

    /// Uses [`AlvinFedoraConverterFactory`] sharing `http`.
    pub fn with_default_converters(config: FedoraConfig, http: Arc<dyn HttpClient>) -> Self {
        let factory = AlvinFedoraConverterFactory::new(config.base_url.clone(), Arc::clone(&http));
        Self::new(config, http, Box::new(factory))
    }

    pub fn config(&self) -> &FedoraConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authorization(&self) -> String {
        basic_authorization(&self.config.username, &self.config.password)
    }

    fn search_pids(&self, query: &str) -> StorageResult<Vec<String>> {
        let url = urls::search_url(self.base_url(), query);
        let response = self.send(&HttpRequest::get(url))?;
        let pids = XPathDocument::parse(&response.body)
            .and_then(|document| document.node_values_at(SEARCH_RESULT_PIDS))
            .map_err(|err| {
                let message = format!("unable to read fedora search result: {err}");
                StorageError::adapter_with_source(message, err)
            })?;
        Ok(pids.into_iter().map(|pid| pid.trim().to_string()).collect())
    }

    fn ensure_place_is_active(&self, id: &str) -> StorageResult<()> {
        if self.search_pids(&urls::active_pid_query(id))?.is_empty() {
            return Err(StorageError::not_found(PLACE_TYPE, id));
        }
        Ok(())
    }

    fn fetch_and_convert_place(&self, id: &str) -> StorageResult<DataGroup> {
        let url = urls::metadata_content_url(self.base_url(), id);
        let response = self.send(&HttpRequest::get(url))?;
        if response.status == NOT_FOUND {
            return Err(StorageError::not_found(PLACE_TYPE, id));
        }
        let converter = self
            .converter_factory
            .factor_to_record_converter(PLACE_TYPE)
            .map_err(|err| StorageError::adapter_with_source(err.to_string(), err))?;
        converter
            .from_xml(&response.body)
            .map_err(|err| StorageError::adapter_with_source(err.to_string(), err))
    }

    fn send(&self, request: &HttpRequest) -> StorageResult<HttpResponse> {
        self.http
            .send(request)
            .map_err(|err| StorageError::adapter_with_source(err.to_string(), err))
    }

    fn create_place(
        &self,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
    ) -> StorageResult<()> {
        let started_at = Instant::now();
        let label = record_label(collected_terms);
        let authorization = self.authorization();
        let creation = PlaceCreation::new(
            self.http.as_ref(),
            self.base_url(),
            &authorization,
            id,
            &label,
        );

        let converter_factory = self.converter_factory.as_ref();
        let outcome = creation.run(|| {
            converter_factory
                .factor_to_fedora_converter(PLACE_TYPE)?
                .to_new_xml(record)
        });
        match outcome {
            Ok(state) => {
                info!(
                    "event=place_create module=fedora status=ok state={} duration_ms={}",
                    state.as_str(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=place_create module=fedora status=error reached={} duration_ms={}",
                    err.reached.as_str(),
                    started_at.elapsed().as_millis()
                );
                Err(StorageError::adapter_with_source(
                    format!("create in fedora failed with message: {err}"),
                    err,
                ))
            }
        }
    }

    fn update_place(
        &self,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
    ) -> StorageResult<()> {
        let wrap =
            |message: String| format!("update to fedora failed for dataRecord: {id}: {message}");
        let url = urls::update_datastream_url(self.base_url(), id, &record_label(collected_terms));
        let xml = self
            .converter_factory
            .factor_to_fedora_converter(PLACE_TYPE)
            .and_then(|converter| converter.to_xml(record))
            .map_err(|err| StorageError::adapter_with_source(wrap(err.to_string()), err))?;

        let request = HttpRequest::put(url)
            .with_header("Authorization", self.authorization())
            .with_body(xml);
        let response = self
            .http
            .send(&request)
            .map_err(|err| StorageError::adapter_with_source(wrap(err.to_string()), err))?;
        if response.status != OK {
            return Err(StorageError::adapter(format!(
                "update to fedora failed for dataRecord: {id}, with response code: {}",
                response.status
            )));
        }
        info!("event=place_update module=fedora status=ok");
        Ok(())
    }

    fn list_places(&self) -> StorageResult<StorageReadResult> {
        let started_at = Instant::now();
        let pids = self.search_pids(&urls::active_namespace_query(urls::PLACE_NAMESPACE))?;
        let places = pids
            .iter()
            .map(|pid| self.fetch_and_convert_place(pid))
            .collect::<StorageResult<Vec<_>>>()?;
        info!(
            "event=place_list module=fedora status=ok count={} duration_ms={}",
            places.len(),
            started_at.elapsed().as_millis()
        );
        Ok(StorageReadResult::new(places))
    }
}

impl RecordStorage for FedoraRecordStorage {
    fn read(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        if record_type != PLACE_TYPE {
            return Err(StorageError::not_implemented_for_type("read", record_type));
        }
        self.ensure_place_is_active(id)?;
        self.fetch_and_convert_place(id)
    }

    fn create(
        &self,
        record_type: &str,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        if record_type != PLACE_TYPE {
            return Err(StorageError::not_implemented_for_type("create", record_type));
        }
        self.create_place(id, record, collected_terms)
    }

    fn update(
        &self,
        record_type: &str,
        id: &str,
        record: &DataGroup,
        collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        if record_type != PLACE_TYPE {
            return Err(StorageError::not_implemented_for_type("update", record_type));
        }
        self.update_place(id, record, collected_terms)
    }

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()> {
        if record_type != PLACE_TYPE {
            return Err(StorageError::not_implemented_for_type(
                "delete_by_type_and_id",
                record_type,
            ));
        }
        let request = HttpRequest::put(urls::soft_delete_url(self.base_url(), id))
            .with_header("Authorization", self.authorization());
        let response = self.send(&request)?;
        if response.status != OK {
            return Err(StorageError::adapter(format!(
                "delete in fedora failed for dataRecord: {id}, with response code: {}",
                response.status
            )));
        }
        info!("event=place_delete module=fedora status=ok");
        Ok(())
    }

    fn links_exist_for_record(&self, _record_type: &str, _id: &str) -> StorageResult<bool> {
        Err(StorageError::not_implemented("links_exist_for_record"))
    }

    fn read_list(&self, record_type: &str, _filter: &DataGroup) -> StorageResult<StorageReadResult> {
        if record_type != PLACE_TYPE {
            return Err(StorageError::not_implemented_for_type("read_list", record_type));
        }
        self.list_places().map_err(|err| {
            let message = format!("Unable to read list of places: {err}");
            StorageError::adapter_with_source(message, err)
        })
    }

    fn read_abstract_list(
        &self,
        _record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<StorageReadResult> {
        Err(StorageError::not_implemented("read_abstract_list"))
    }

    fn read_link_list(&self, _record_type: &str, _id: &str) -> StorageResult<DataGroup> {
        Err(StorageError::not_implemented("read_link_list"))
    }

    fn generate_link_collection_pointing_to_record(
        &self,
        _record_type: &str,
        _id: &str,
    ) -> StorageResult<Vec<DataGroup>> {
        Err(StorageError::not_implemented(
            "generate_link_collection_pointing_to_record",
        ))
    }

    fn record_exists(&self, _record_type: &str, _id: &str) -> StorageResult<bool> {
        Err(StorageError::not_implemented("record_exists"))
    }

    fn records_exist_for_record_type(&self, record_type: &str) -> StorageResult<bool> {
        Err(StorageError::not_implemented_for_type(
            "records_exist_for_record_type",
            record_type,
        ))
    }

    fn total_number_of_records_for_type(
        &self,
        record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        Err(StorageError::not_implemented_for_type(
            "total_number_of_records_for_type",
            record_type,
        ))
    }

    fn total_number_of_records_for_abstract_type(
        &self,
        abstract_type: &str,
        _implementing_types: &[String],
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        Err(StorageError::not_implemented_for_type(
            "total_number_of_records_for_abstract_type",
            abstract_type,
        ))
    }
}
