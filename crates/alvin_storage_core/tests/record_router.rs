use alvin_storage_core::{
    DataGroup, MixedRecordStorage, RecordStorage, StorageConfig, StorageError, StorageErrorKind,
    StorageReadResult, StorageResult,
};
use std::sync::{Arc, Mutex};
use std::thread;

/// Backend that answers every call and records `operation:type:id`.
struct SpyStorage {
    name: &'static str,
    calls: Mutex<Vec<String>>,
}

impl SpyStorage {
    fn named(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, operation: &str, record_type: &str, id: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation}:{record_type}:{id}"));
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self) -> DataGroup {
        DataGroup::new(self.name)
    }
}

impl RecordStorage for SpyStorage {
    fn read(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        self.record("read", record_type, id);
        Ok(self.answer())
    }

    fn create(
        &self,
        record_type: &str,
        id: &str,
        _record: &DataGroup,
        _collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        self.record("create", record_type, id);
        Ok(())
    }

    fn update(
        &self,
        record_type: &str,
        id: &str,
        _record: &DataGroup,
        _collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        self.record("update", record_type, id);
        Ok(())
    }

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()> {
        self.record("delete", record_type, id);
        Ok(())
    }

    fn links_exist_for_record(&self, record_type: &str, id: &str) -> StorageResult<bool> {
        self.record("links_exist", record_type, id);
        Ok(true)
    }

    fn read_list(&self, record_type: &str, _filter: &DataGroup) -> StorageResult<StorageReadResult> {
        self.record("read_list", record_type, "");
        Ok(StorageReadResult::new(vec![self.answer()]))
    }

    fn read_abstract_list(
        &self,
        record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<StorageReadResult> {
        self.record("read_abstract_list", record_type, "");
        Ok(StorageReadResult::new(vec![self.answer()]))
    }

    fn read_link_list(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        self.record("read_link_list", record_type, id);
        Ok(self.answer())
    }

    fn generate_link_collection_pointing_to_record(
        &self,
        record_type: &str,
        id: &str,
    ) -> StorageResult<Vec<DataGroup>> {
        self.record("generate_link_collection", record_type, id);
        Ok(vec![self.answer()])
    }

    fn record_exists(&self, record_type: &str, id: &str) -> StorageResult<bool> {
        self.record("record_exists", record_type, id);
        Ok(true)
    }

    fn records_exist_for_record_type(&self, record_type: &str) -> StorageResult<bool> {
        self.record("records_exist", record_type, "");
        Ok(true)
    }

    fn total_number_of_records_for_type(
        &self,
        record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        self.record("total", record_type, "");
        Ok(7)
    }

    fn total_number_of_records_for_abstract_type(
        &self,
        abstract_type: &str,
        implementing_types: &[String],
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        self.record("total_abstract", abstract_type, &implementing_types.join(","));
        Ok(implementing_types.len())
    }
}

/// Backend failing every read with NotFound.
struct MissingStorage;

impl MissingStorage {
    fn missing<T>(record_type: &str, id: &str) -> StorageResult<T> {
        Err(StorageError::not_found(record_type, id))
    }
}

impl RecordStorage for MissingStorage {
    fn read(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        Self::missing(record_type, id)
    }

    fn create(
        &self,
        record_type: &str,
        id: &str,
        _record: &DataGroup,
        _collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        Self::missing(record_type, id)
    }

    fn update(
        &self,
        record_type: &str,
        id: &str,
        _record: &DataGroup,
        _collected_terms: &DataGroup,
        _link_list: &DataGroup,
        _data_divider: &str,
    ) -> StorageResult<()> {
        Self::missing(record_type, id)
    }

    fn delete_by_type_and_id(&self, record_type: &str, id: &str) -> StorageResult<()> {
        Self::missing(record_type, id)
    }

    fn links_exist_for_record(&self, record_type: &str, id: &str) -> StorageResult<bool> {
        Self::missing(record_type, id)
    }

    fn read_list(&self, record_type: &str, _filter: &DataGroup) -> StorageResult<StorageReadResult> {
        Self::missing(record_type, "")
    }

    fn read_abstract_list(
        &self,
        record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<StorageReadResult> {
        Self::missing(record_type, "")
    }

    fn read_link_list(&self, record_type: &str, id: &str) -> StorageResult<DataGroup> {
        Self::missing(record_type, id)
    }

    fn generate_link_collection_pointing_to_record(
        &self,
        record_type: &str,
        id: &str,
    ) -> StorageResult<Vec<DataGroup>> {
        Self::missing(record_type, id)
    }

    fn record_exists(&self, _record_type: &str, _id: &str) -> StorageResult<bool> {
        Ok(false)
    }

    fn records_exist_for_record_type(&self, _record_type: &str) -> StorageResult<bool> {
        Ok(false)
    }

    fn total_number_of_records_for_type(
        &self,
        _record_type: &str,
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        Ok(0)
    }

    fn total_number_of_records_for_abstract_type(
        &self,
        _abstract_type: &str,
        _implementing_types: &[String],
        _filter: &DataGroup,
    ) -> StorageResult<usize> {
        Ok(0)
    }
}

struct Fixture {
    generic: Arc<SpyStorage>,
    fedora: Arc<SpyStorage>,
    sql_user: Arc<SpyStorage>,
    router: MixedRecordStorage,
}

fn fixture() -> Fixture {
    let generic = SpyStorage::named("generic");
    let fedora = SpyStorage::named("fedora");
    let sql_user = SpyStorage::named("sql");
    let router = MixedRecordStorage::new(generic.clone(), fedora.clone(), sql_user.clone());
    Fixture {
        generic,
        fedora,
        sql_user,
        router,
    }
}

fn filter() -> DataGroup {
    DataGroup::new("filter")
}

fn write_with(router: &MixedRecordStorage, operation: &str, record_type: &str) {
    let record = DataGroup::new("record");
    let terms = DataGroup::new("collectedData");
    let links = DataGroup::new("collectedDataLinks");
    let result = match operation {
        "create" => router.create(record_type, "id:1", &record, &terms, &links, "alvin"),
        _ => router.update(record_type, "id:1", &record, &terms, &links, "alvin"),
    };
    result.unwrap();
}

#[test]
fn place_reads_and_writes_go_to_fedora() {
    let fixture = fixture();

    let record = fixture.router.read("place", "alvin-place:1").unwrap();
    write_with(&fixture.router, "create", "place");
    write_with(&fixture.router, "update", "place");
    let list = fixture.router.read_list("place", &filter()).unwrap();

    assert_eq!(record.name_in_data, "fedora");
    assert_eq!(list.list_of_data_groups[0].name_in_data, "fedora");
    assert_eq!(
        fixture.fedora.calls(),
        vec![
            "read:place:alvin-place:1",
            "create:place:id:1",
            "update:place:id:1",
            "read_list:place:",
        ]
    );
    assert!(fixture.generic.calls().is_empty());
    assert!(fixture.sql_user.calls().is_empty());
}

#[test]
fn place_delete_and_link_queries_go_to_generic() {
    let fixture = fixture();

    fixture
        .router
        .delete_by_type_and_id("place", "alvin-place:1")
        .unwrap();
    fixture
        .router
        .links_exist_for_record("place", "alvin-place:1")
        .unwrap();
    fixture.router.read_abstract_list("place", &filter()).unwrap();

    assert!(fixture.fedora.calls().is_empty());
    assert_eq!(
        fixture.generic.calls(),
        vec![
            "delete:place:alvin-place:1",
            "links_exist:place:alvin-place:1",
            "read_abstract_list:place:",
        ]
    );
}

#[test]
fn user_reads_go_to_sql() {
    let fixture = fixture();

    let record = fixture.router.read("user", "52").unwrap();
    let list = fixture.router.read_abstract_list("user", &filter()).unwrap();

    assert_eq!(record.name_in_data, "sql");
    assert_eq!(list.total_number_of_matches, 1);
    assert_eq!(
        fixture.sql_user.calls(),
        vec!["read:user:52", "read_abstract_list:user:"]
    );
    assert!(fixture.generic.calls().is_empty());
}

#[test]
fn user_writes_and_concrete_lists_go_to_generic() {
    let fixture = fixture();

    write_with(&fixture.router, "create", "user");
    write_with(&fixture.router, "update", "user");
    fixture.router.read_list("user", &filter()).unwrap();

    assert!(fixture.sql_user.calls().is_empty());
    assert_eq!(
        fixture.generic.calls(),
        vec!["create:user:id:1", "update:user:id:1", "read_list:user:"]
    );
}

#[test]
fn user_existence_goes_to_generic() {
    let fixture = fixture();

    assert!(fixture.router.record_exists("user", "52").unwrap());

    assert_eq!(fixture.generic.calls(), vec!["record_exists:user:52"]);
    assert!(fixture.sql_user.calls().is_empty());
}

#[test]
fn guest_user_read_goes_to_generic() {
    let generic = SpyStorage::named("generic");
    let sql_user = SpyStorage::named("sql");
    let fedora = SpyStorage::named("fedora");
    let router = MixedRecordStorage::new(generic.clone(), fedora, sql_user.clone())
        .with_guest_user_id("coraUser:5368244264733286");

    let guest = router.read("user", "coraUser:5368244264733286").unwrap();
    let other = router.read("user", "52").unwrap();

    assert_eq!(guest.name_in_data, "generic");
    assert_eq!(other.name_in_data, "sql");
    assert_eq!(router.guest_user_id(), Some("coraUser:5368244264733286"));
    assert_eq!(generic.calls(), vec!["read:user:coraUser:5368244264733286"]);
    assert_eq!(sql_user.calls(), vec!["read:user:52"]);
}

#[test]
fn other_types_go_to_generic_for_every_operation() {
    let fixture = fixture();
    let router = &fixture.router;
    let implementing = vec!["book".to_string(), "article".to_string()];

    router.read("book", "book:1").unwrap();
    write_with(router, "create", "book");
    write_with(router, "update", "book");
    router.delete_by_type_and_id("book", "book:1").unwrap();
    router.read_list("book", &filter()).unwrap();
    router.read_abstract_list("binary", &filter()).unwrap();
    router.read_link_list("book", "book:1").unwrap();
    router
        .generate_link_collection_pointing_to_record("book", "book:1")
        .unwrap();
    router.records_exist_for_record_type("book").unwrap();
    assert_eq!(
        router
            .total_number_of_records_for_type("book", &filter())
            .unwrap(),
        7
    );
    assert_eq!(
        router
            .total_number_of_records_for_abstract_type("text", &implementing, &filter())
            .unwrap(),
        2
    );

    assert_eq!(fixture.generic.calls().len(), 11);
    assert_eq!(
        fixture.generic.calls().last().map(String::as_str),
        Some("total_abstract:text:book,article")
    );
    assert!(fixture.fedora.calls().is_empty());
    assert!(fixture.sql_user.calls().is_empty());
}

#[test]
fn backend_errors_pass_through_unchanged() {
    let router = MixedRecordStorage::new(
        Arc::new(MissingStorage),
        Arc::new(MissingStorage),
        Arc::new(MissingStorage),
    );

    let err = router.read("place", "alvin-place:9").unwrap_err();
    assert_eq!(err.kind(), StorageErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "record not found for type: place and id: alvin-place:9"
    );
    assert!(!router.record_exists("user", "52").unwrap());
}

#[test]
fn assembly_from_invalid_config_is_rejected() {
    let config = StorageConfig::from_lookup(|key| match key {
        "ALVIN_FEDORA_URL" => Some("http://alvin-cora-fedora:8088/fedora".to_string()),
        "ALVIN_FEDORA_USERNAME" => Some("fedoraUser".to_string()),
        "ALVIN_FEDORA_PASSWORD" => Some("fedoraPass".to_string()),
        "ALVIN_USER_DB" => Some("/tmp/alvin-users.db".to_string()),
        _ => None,
    })
    .unwrap();
    let mut broken = config.clone();
    broken.fedora.base_url = "ftp://alvin-cora-fedora".to_string();

    let result = MixedRecordStorage::from_config(&broken, Arc::new(MissingStorage));

    let err = result.err().expect("invalid url should be rejected");
    assert_eq!(err.kind(), StorageErrorKind::Config);
}

#[test]
fn assembly_from_config_applies_guest_user() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::from_lookup(|key| match key {
        "ALVIN_FEDORA_URL" => Some("http://alvin-cora-fedora:8088/fedora".to_string()),
        "ALVIN_FEDORA_USERNAME" => Some("fedoraUser".to_string()),
        "ALVIN_FEDORA_PASSWORD" => Some("fedoraPass".to_string()),
        "ALVIN_USER_DB" => dir.path().join("users.db").to_str().map(str::to_string),
        "ALVIN_GUEST_USER_ID" => Some("coraUser:guest".to_string()),
        _ => None,
    })
    .unwrap();

    let router = MixedRecordStorage::from_config(&config, Arc::new(MissingStorage)).unwrap();

    assert_eq!(router.guest_user_id(), Some("coraUser:guest"));
    assert!(router.read("user", "coraUser:guest").is_err());
}

#[test]
fn router_is_shared_across_threads() {
    let fixture = fixture();
    let router = Arc::new(fixture.router);

    let handles: Vec<_> = ["alvin-place:1", "alvin-place:2"]
        .into_iter()
        .map(|id| {
            let router = Arc::clone(&router);
            thread::spawn(move || router.read("place", id).map(|record| record.name_in_data))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "fedora");
    }

    let mut calls = fixture.fedora.calls();
    calls.sort();
    assert_eq!(calls, vec!["read:place:alvin-place:1", "read:place:alvin-place:2"]);
    assert!(fixture.generic.calls().is_empty());
}
