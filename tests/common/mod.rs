//! In-memory collaborators for engine tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use municipality_check::config::RuleSet;
use municipality_check::db::{
    EmployeeLookup, EmployeeRow, Report, ReportSink, SubmitResult, Tracker, TrackingOutcome,
    WorkQueue,
};
use municipality_check::engine::{QueueDriver, QueuePopulator, ReferenceResolver, TaskOrchestrator};
use municipality_check::error::{Error, Result};
use municipality_check::model::reference::{ENGAGEMENT_REFERENCE, PROFESSIONAL_REFERENCE};
use municipality_check::model::work::{NewWorkItem, State, WorkId, WorkItem};
use municipality_check::model::{
    Citizen, Employee, Engagement, NewTask, Organization, PathwayView, ProfessionalAssignment,
    Reference, Task,
};
use municipality_check::nexus::{
    CitizenStore, EmployeeDirectory, EngagementFilter, OrganizationDirectory, PathwayStore,
    TaskStore, tree,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;

pub const CASE_WORKER_GROUP: &str = "Børn og Unge Grundforløb";
pub const SOCIAL_GROUP: &str = "Socialfagligt grundforløb";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A citizen document; a `false` flag leaves that municipality out.
pub fn citizen(identifier: &str, paying: bool, acting: bool) -> Citizen {
    let mut info = serde_json::Map::new();
    if paying {
        info.insert(
            "payingMunicipalityValueSchedule".into(),
            json!({"id": 461, "name": "Odense"}),
        );
    }
    if acting {
        info.insert(
            "actingMunicipalityValueSchedule".into(),
            json!({"id": 461, "name": "Odense"}),
        );
    }
    serde_json::from_value(json!({
        "id": 1,
        "patientIdentifier": {"identifier": identifier},
        "patientState": {"name": "Aktiv"},
        "patientReimbursementInformation": info,
        "_links": {"self": {"href": format!("https://nexus.test/patients/{identifier}")}}
    }))
    .unwrap()
}

pub fn deceased(identifier: &str) -> Citizen {
    let mut c = citizen(identifier, true, true);
    c.patient_state = serde_json::from_value(json!({"name": "Død"})).unwrap();
    c
}

pub fn professional_ref(name: &str) -> Reference {
    Reference::new(PROFESSIONAL_REFERENCE, name)
}

pub fn engagement_ref(name: &str, state: &str) -> Reference {
    Reference::new(ENGAGEMENT_REFERENCE, name).workflow_state(state)
}

pub fn indsatser(children: Vec<Reference>) -> Reference {
    children
        .into_iter()
        .fold(Reference::new("folder", "Indsatser"), Reference::child)
}

/// Case worker one level below the group, one active engagement in the same pathway.
pub fn standard_tree() -> Vec<Reference> {
    vec![Reference::pathway(CASE_WORKER_GROUP, true).child(
        Reference::pathway("Sag", true)
            .child(professional_ref("sagsbehandler"))
            .child(indsatser(vec![engagement_ref("Aflastning", "Bevilget")])),
    )]
}

pub fn employee(id: i64, initials: &str, organization: Option<&str>) -> Employee {
    let mut doc = json!({"id": id, "initials": initials, "fullName": "Sara Sagsbehandler"});
    if let Some(org) = organization {
        doc["primaryOrganization"] = json!({"id": 9, "name": org});
    }
    serde_json::from_value(doc).unwrap()
}

pub fn engagement(id: i64, name: &str) -> Engagement {
    serde_json::from_value(json!({"id": id, "name": name})).unwrap()
}

pub fn assignment(activity_id: &str) -> ProfessionalAssignment {
    serde_json::from_value(json!({"activityIdentifier": {"activityId": activity_id}})).unwrap()
}

pub fn task(task_type: &str) -> Task {
    serde_json::from_value(json!({"type": task_type, "title": "x"})).unwrap()
}

// ---------------------------------------------------------------------------
// Nexus
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeNexus {
    pub organizations: Vec<Organization>,
    pub rosters: HashMap<i64, Vec<Citizen>>,
    /// Live documents by national ID; citizens not listed refresh to themselves.
    pub live: HashMap<String, Citizen>,
    pub failing_refresh: HashSet<String>,
    pub view: Option<PathwayView>,
    pub tree: Vec<Reference>,
    /// Reference targets, keyed by reference name.
    pub professionals: HashMap<String, ProfessionalAssignment>,
    pub engagements: HashMap<String, Engagement>,
    pub employees: HashMap<String, Employee>,
    pub histories: Mutex<HashMap<i64, Vec<Task>>>,
    pub created: Mutex<Vec<(i64, NewTask)>>,
    pub fail_task_creation: bool,
    pub path_queries: Mutex<Vec<String>>,
    pub engagement_filter_calls: Mutex<usize>,
    pub resolved_engagements: Mutex<Vec<String>>,
}

impl FakeNexus {
    /// A Nexus in which every resolution hop succeeds.
    pub fn standard() -> Self {
        let mut nexus = Self {
            view: Some(PathwayView {
                id: Some(1),
                name: "- Alt".to_string(),
                links: Default::default(),
            }),
            tree: standard_tree(),
            ..Default::default()
        };
        nexus
            .professionals
            .insert("sagsbehandler".into(), assignment("A-17"));
        nexus
            .engagements
            .insert("Aflastning".into(), engagement(42, "Aflastning"));
        nexus.employees.insert(
            "SSA".into(),
            employee(7, "SSA", Some("Familieafdelingen")),
        );
        nexus
    }

    pub fn with_organization(mut self, id: i64, name: &str, citizens: Vec<Citizen>) -> Self {
        self.organizations.push(
            serde_json::from_value(json!({"id": id, "name": name})).unwrap(),
        );
        self.rosters.insert(id, citizens);
        self
    }

    pub fn created_tasks(&self) -> Vec<(i64, NewTask)> {
        self.created.lock().unwrap().clone()
    }

    pub fn path_queries(&self) -> Vec<String> {
        self.path_queries.lock().unwrap().clone()
    }

    pub fn engagement_filter_calls(&self) -> usize {
        *self.engagement_filter_calls.lock().unwrap()
    }
}

#[async_trait]
impl OrganizationDirectory for FakeNexus {
    async fn find_organization_by_name(&self, name: &str) -> Result<Option<Organization>> {
        Ok(self.organizations.iter().find(|o| o.name == name).cloned())
    }

    async fn list_citizens(&self, organization: &Organization) -> Result<Vec<Citizen>> {
        Ok(self
            .rosters
            .get(&organization.id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl CitizenStore for FakeNexus {
    async fn refresh_citizen(&self, citizen: &Citizen) -> Result<Citizen> {
        let id = citizen.national_id();
        if self.failing_refresh.contains(&id) {
            return Err(Error::Api {
                status: 503,
                url: format!("https://nexus.test/patients/{id}"),
            });
        }
        Ok(self.live.get(&id).cloned().unwrap_or_else(|| citizen.clone()))
    }
}

#[async_trait]
impl PathwayStore for FakeNexus {
    async fn pathway_view(&self, _citizen: &Citizen) -> Result<Option<PathwayView>> {
        Ok(self.view.clone())
    }

    async fn references(&self, _view: &PathwayView) -> Result<Vec<Reference>> {
        Ok(self.tree.clone())
    }

    async fn resolve_professional(
        &self,
        reference: &Reference,
    ) -> Result<Option<ProfessionalAssignment>> {
        Ok(self.professionals.get(&reference.name).cloned())
    }

    async fn resolve_engagement(&self, reference: &Reference) -> Result<Option<Engagement>> {
        self.resolved_engagements
            .lock()
            .unwrap()
            .push(reference.name.clone());
        Ok(self.engagements.get(&reference.name).cloned())
    }

    fn filter_by_path(
        &self,
        references: &[Reference],
        pattern: &str,
        active_pathways_only: bool,
    ) -> Vec<Reference> {
        self.path_queries.lock().unwrap().push(pattern.to_string());
        tree::filter_by_path(references, pattern, active_pathways_only)
            .into_iter()
            .cloned()
            .collect()
    }

    fn filter_engagements(
        &self,
        references: Vec<Reference>,
        filter: EngagementFilter,
    ) -> Vec<Reference> {
        *self.engagement_filter_calls.lock().unwrap() += 1;
        tree::filter_engagement_references(references, filter)
    }
}

#[async_trait]
impl TaskStore for FakeNexus {
    async fn task_history(&self, engagement: &Engagement) -> Result<Vec<Task>> {
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(&engagement.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_task(&self, engagement: &Engagement, task: &NewTask) -> Result<()> {
        if self.fail_task_creation {
            return Err(Error::Api {
                status: 500,
                url: "https://nexus.test/tasks".into(),
            });
        }
        self.created
            .lock()
            .unwrap()
            .push((engagement.id, task.clone()));
        let created: Task = serde_json::from_value(json!({
            "type": task.task_type,
            "title": task.title,
            "startDate": task.start_date,
            "dueDate": task.due_date,
        }))?;
        self.histories
            .lock()
            .unwrap()
            .entry(engagement.id)
            .or_default()
            .push(created);
        Ok(())
    }
}

#[async_trait]
impl EmployeeDirectory for FakeNexus {
    async fn find_employee_by_initials(&self, initials: &str) -> Result<Option<Employee>> {
        Ok(self.employees.get(initials).cloned())
    }
}

// ---------------------------------------------------------------------------
// Nexus database
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeLookup {
    pub rows: HashMap<String, Vec<EmployeeRow>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn standard() -> Self {
        let mut lookup = Self::default();
        lookup.rows.insert(
            "A-17".into(),
            vec![EmployeeRow {
                primary_identifier: "SSA".into(),
            }],
        );
        lookup
    }
}

#[async_trait]
impl EmployeeLookup for FakeLookup {
    async fn find_employee_by_activity_id(&self, activity_id: &str) -> Result<Vec<EmployeeRow>> {
        self.calls.lock().unwrap().push(activity_id.to_string());
        Ok(self.rows.get(activity_id).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Queue, reports, tracking
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryQueue {
    items: Mutex<Vec<WorkItem>>,
}

impl MemoryQueue {
    pub fn items(&self) -> Vec<WorkItem> {
        self.items.lock().unwrap().clone()
    }

    pub fn in_state(&self, state: State) -> Vec<WorkItem> {
        self.items()
            .into_iter()
            .filter(|i| i.state == state)
            .collect()
    }

    fn transition(&self, id: WorkId, to: State, message: Option<&str>) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(format!("work item {id}")))?;
        if !item.state.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: item.state.to_string(),
                to: to.to_string(),
            });
        }
        item.state = to;
        item.message = message.map(str::to_string);
        item.updated_at = Utc::now();
        if to.is_terminal() {
            item.resolved_at = Some(item.updated_at);
        }
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn add_item(&self, item: NewWorkItem) -> Result<SubmitResult> {
        let mut items = self.items.lock().unwrap();
        if let Some(existing) = items
            .iter()
            .find(|i| i.reference == item.reference && i.state == State::New)
        {
            return Ok(SubmitResult::Duplicate(existing.id));
        }
        let now = Utc::now();
        let id = WorkId::new();
        items.push(WorkItem {
            id,
            reference: item.reference,
            data: item.data,
            state: State::New,
            message: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        });
        Ok(SubmitResult::Created(id))
    }

    async fn get_items_by_reference(
        &self,
        reference: &str,
        state: State,
    ) -> Result<Vec<WorkItem>> {
        Ok(self
            .items()
            .into_iter()
            .filter(|i| i.reference == reference && i.state == state)
            .collect())
    }

    async fn clear(&self, state: State) -> Result<u64> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.state != state);
        Ok((before - items.len()) as u64)
    }

    async fn claim_next(&self) -> Result<Option<WorkItem>> {
        let next = self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.state == State::New)
            .map(|i| i.id);
        match next {
            Some(id) => {
                self.transition(id, State::InProgress, None)?;
                Ok(self.items().into_iter().find(|i| i.id == id))
            }
            None => Ok(None),
        }
    }

    async fn complete(&self, id: WorkId) -> Result<()> {
        self.transition(id, State::Completed, None)
    }

    async fn fail(&self, id: WorkId, reason: &str) -> Result<()> {
        self.transition(id, State::Failed, Some(reason))
    }

    async fn fail_stale(&self, older_than: TimeDelta, reason: &str) -> Result<u64> {
        let cutoff = Utc::now() - older_than;
        let stale: Vec<WorkId> = self
            .items()
            .into_iter()
            .filter(|i| i.state == State::InProgress && i.updated_at <= cutoff)
            .map(|i| i.id)
            .collect();
        for id in &stale {
            self.transition(*id, State::Failed, Some(reason))?;
        }
        Ok(stale.len() as u64)
    }
}

/// Queue whose first `complete` call fails, as on a dropped connection.
#[derive(Default)]
pub struct FlakyCompleteQueue {
    pub inner: MemoryQueue,
    pub tripped: Mutex<bool>,
}

#[async_trait]
impl WorkQueue for FlakyCompleteQueue {
    async fn add_item(&self, item: NewWorkItem) -> Result<SubmitResult> {
        self.inner.add_item(item).await
    }

    async fn get_items_by_reference(
        &self,
        reference: &str,
        state: State,
    ) -> Result<Vec<WorkItem>> {
        self.inner.get_items_by_reference(reference, state).await
    }

    async fn clear(&self, state: State) -> Result<u64> {
        self.inner.clear(state).await
    }

    async fn claim_next(&self) -> Result<Option<WorkItem>> {
        self.inner.claim_next().await
    }

    async fn complete(&self, id: WorkId) -> Result<()> {
        let first_call = {
            let mut tripped = self.tripped.lock().unwrap();
            !std::mem::replace(&mut *tripped, true)
        };
        if first_call {
            return Err(Error::Other("connection reset".into()));
        }
        self.inner.complete(id).await
    }

    async fn fail(&self, id: WorkId, reason: &str) -> Result<()> {
        self.inner.fail(id, reason).await
    }

    async fn fail_stale(&self, older_than: TimeDelta, reason: &str) -> Result<u64> {
        self.inner.fail_stale(older_than, reason).await
    }
}

#[derive(Default)]
pub struct RecordingReports {
    pub reports: Mutex<Vec<Report>>,
}

impl RecordingReports {
    pub fn all(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingReports {
    async fn report(&self, report: Report) -> Result<()> {
        self.reports.lock().unwrap().push(report);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTracker {
    pub events: Mutex<Vec<(String, TrackingOutcome)>>,
}

impl RecordingTracker {
    pub fn outcomes(&self) -> Vec<TrackingOutcome> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, o)| *o)
            .collect()
    }
}

#[async_trait]
impl Tracker for RecordingTracker {
    async fn track(&self, process_name: &str, outcome: TrackingOutcome) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((process_name.to_string(), outcome));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub nexus: Arc<FakeNexus>,
    pub lookup: Arc<FakeLookup>,
    pub queue: Arc<MemoryQueue>,
    pub reports: Arc<RecordingReports>,
    pub tracker: Arc<RecordingTracker>,
}

impl Harness {
    pub fn new(nexus: FakeNexus, lookup: FakeLookup) -> Self {
        Self {
            nexus: Arc::new(nexus),
            lookup: Arc::new(lookup),
            queue: Arc::new(MemoryQueue::default()),
            reports: Arc::new(RecordingReports::default()),
            tracker: Arc::new(RecordingTracker::default()),
        }
    }

    pub fn standard() -> Self {
        Self::new(FakeNexus::standard(), FakeLookup::standard())
    }

    pub fn resolver(&self) -> ReferenceResolver {
        ReferenceResolver::new(
            self.nexus.clone(),
            self.lookup.clone(),
            self.nexus.clone(),
        )
    }

    pub fn orchestrator(&self) -> TaskOrchestrator {
        TaskOrchestrator::new(
            self.resolver(),
            self.nexus.clone(),
            self.reports.clone(),
            self.tracker.clone(),
        )
    }

    pub fn driver(&self) -> QueueDriver {
        QueueDriver::new(self.queue.clone(), self.nexus.clone(), self.orchestrator())
    }

    pub fn populator(&self, rules: RuleSet) -> QueuePopulator {
        QueuePopulator::new(self.nexus.clone(), self.queue.clone(), rules)
    }

    /// Enqueue citizens directly, bypassing the populator.
    pub async fn enqueue(&self, citizens: &[Citizen]) {
        for c in citizens {
            self.queue
                .add_item(NewWorkItem::new(
                    c.national_id(),
                    serde_json::to_value(c).unwrap(),
                ))
                .await
                .unwrap();
        }
    }
}

pub fn rules(organisations: &[&str]) -> RuleSet {
    let list: Vec<String> = organisations.iter().map(|o| format!("{o:?}")).collect();
    RuleSet::parse(&format!("organisations = [{}]", list.join(", "))).unwrap()
}
