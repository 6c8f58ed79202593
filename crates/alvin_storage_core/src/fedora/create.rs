//! Three-step place creation as an explicit state machine.
//!
//! Object, model relation and `METADATA` datastream are written in that
//! order. A failed step stops the sequence; steps already applied stay in
//! the repository, since there is no compensation.

use super::urls;
use crate::convert::{ConvertError, ConvertResult};
use crate::http::{HttpClient, HttpError, HttpRequest};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Progress of one creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateState {
    NotStarted,
    ObjectCreated,
    RelationCreated,
    DatastreamWritten,
}

impl CreateState {
    /// Step that moves this state forward; `None` once complete.
    pub fn next_step(self) -> Option<CreateStep> {
        match self {
            Self::NotStarted => Some(CreateStep::CreateObject),
            Self::ObjectCreated => Some(CreateStep::CreateRelation),
            Self::RelationCreated => Some(CreateStep::WriteDatastream),
            Self::DatastreamWritten => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::ObjectCreated => "object_created",
            Self::RelationCreated => "relation_created",
            Self::DatastreamWritten => "datastream_written",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    CreateObject,
    CreateRelation,
    WriteDatastream,
}

impl CreateStep {
    /// HTTP status the repository answers a successful step with.
    pub fn expected_status(self) -> u16 {
        match self {
            Self::CreateObject | Self::WriteDatastream => 201,
            Self::CreateRelation => 200,
        }
    }

    /// State reached once this step succeeded.
    pub fn completes(self) -> CreateState {
        match self {
            Self::CreateObject => CreateState::ObjectCreated,
            Self::CreateRelation => CreateState::RelationCreated,
            Self::WriteDatastream => CreateState::DatastreamWritten,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::CreateObject => "creating object in fedora",
            Self::CreateRelation => "creating relation in fedora",
            Self::WriteDatastream => "creating datastream in fedora",
        }
    }
}

#[derive(Debug)]
pub enum StepFailure {
    Status(u16),
    Http(HttpError),
    Convert(ConvertError),
}

/// A creation that stopped before [`CreateState::DatastreamWritten`].
#[derive(Debug)]
pub struct CreateError {
    /// Last state reached; everything up to it exists in the repository.
    pub reached: CreateState,
    pub step: CreateStep,
    pub failure: StepFailure,
}

impl Display for CreateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.failure {
            StepFailure::Status(status) => write!(
                f,
                "{} failed, with response code: {status}",
                self.step.description()
            ),
            StepFailure::Http(err) => write!(f, "{} failed: {err}", self.step.description()),
            StepFailure::Convert(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CreateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.failure {
            StepFailure::Status(_) => None,
            StepFailure::Http(err) => Some(err),
            StepFailure::Convert(err) => Some(err),
        }
    }
}

/// One place creation against the repository.
pub struct PlaceCreation<'a> {
    http: &'a dyn HttpClient,
    base_url: &'a str,
    authorization: &'a str,
    id: &'a str,
    label: &'a str,
    state: CreateState,
}

impl<'a> PlaceCreation<'a> {
    pub fn new(
        http: &'a dyn HttpClient,
        base_url: &'a str,
        authorization: &'a str,
        id: &'a str,
        label: &'a str,
    ) -> Self {
        Self {
            http,
            base_url,
            authorization,
            id,
            label,
            state: CreateState::NotStarted,
        }
    }

    pub fn state(&self) -> CreateState {
        self.state
    }

    /// Runs every remaining step. `new_xml` is called only once the object
    /// and its relation exist.
    pub fn run(
        mut self,
        new_xml: impl FnOnce() -> ConvertResult<String>,
    ) -> Result<CreateState, CreateError> {
        let mut new_xml = Some(new_xml);
        while let Some(step) = self.state.next_step() {
            let body = match step {
                CreateStep::WriteDatastream => match new_xml.take().map(|convert| convert()) {
                    Some(Ok(xml)) => Some(xml),
                    Some(Err(err)) => return Err(self.fail(step, StepFailure::Convert(err))),
                    None => None,
                },
                CreateStep::CreateObject | CreateStep::CreateRelation => None,
            };
            self.perform(step, body)?;
        }
        Ok(self.state)
    }

    fn perform(&mut self, step: CreateStep, body: Option<String>) -> Result<(), CreateError> {
        let started_at = Instant::now();
        let url = match step {
            CreateStep::CreateObject => urls::create_object_url(self.base_url, self.id, self.label),
            CreateStep::CreateRelation => urls::create_relation_url(self.base_url, self.id),
            CreateStep::WriteDatastream => {
                urls::create_datastream_url(self.base_url, self.id, self.label)
            }
        };
        let mut request = HttpRequest::post(url).with_header("Authorization", self.authorization);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = self
            .http
            .send(&request)
            .map_err(|err| self.fail(step, StepFailure::Http(err)))?;
        if response.status != step.expected_status() {
            return Err(self.fail(step, StepFailure::Status(response.status)));
        }

        self.state = step.completes();
        info!(
            "event=fedora_create module=fedora status=ok state={} duration_ms={}",
            self.state.as_str(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn fail(&self, step: CreateStep, failure: StepFailure) -> CreateError {
        warn!(
            "event=fedora_create module=fedora status=error reached={} error_code=step_failed",
            self.state.as_str()
        );
        CreateError {
            reached: self.state,
            step,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateState, CreateStep};

    #[test]
    fn states_advance_in_protocol_order() {
        let mut state = CreateState::NotStarted;
        let mut steps = Vec::new();
        while let Some(step) = state.next_step() {
            steps.push(step);
            state = step.completes();
        }
        assert_eq!(
            steps,
            vec![
                CreateStep::CreateObject,
                CreateStep::CreateRelation,
                CreateStep::WriteDatastream
            ]
        );
        assert_eq!(state, CreateState::DatastreamWritten);
    }

    #[test]
    fn relation_step_expects_ok_and_others_created() {
        assert_eq!(CreateStep::CreateObject.expected_status(), 201);
        assert_eq!(CreateStep::CreateRelation.expected_status(), 200);
        assert_eq!(CreateStep::WriteDatastream.expected_status(), 201);
    }
}
