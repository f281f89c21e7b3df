#![allow(dead_code)]

use async_trait::async_trait;
use cloudflow_core::{
    CloudError, ComputeApi, ComputeInstance, DatabaseApi, DatabaseInstance, DeploymentApi,
    DeploymentGroupInfo, DeploymentInstanceSummary, DeploymentStatus, Event, InstanceState, Item,
    KeyValueApi, Observer, Result, Revision, Tag, TagFilter, Target,
};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

struct FakeInstance {
    instance: ComputeInstance,
    /// Target state and the number of id-describes until it is reached
    transition: Option<(InstanceState, u32)>,
}

struct FakeDeployment {
    statuses: VecDeque<DeploymentStatus>,
    summaries: Vec<DeploymentInstanceSummary>,
}

#[derive(Default)]
struct State {
    instances: Vec<FakeInstance>,
    databases: Vec<(DatabaseInstance, VecDeque<String>)>,
    deployments: HashMap<String, FakeDeployment>,
    groups: HashMap<(String, String), DeploymentGroupInfo>,
    tables: BTreeMap<String, Vec<Item>>,
    fail_modify: HashSet<String>,
    calls: Vec<String>,
    describe_by_id_calls: u32,
    created_deployments: u32,
    /// Targets in the order their describe calls returned
    completed_describes: Vec<Target>,
}

/// In-memory provider implementing every facade trait
pub struct FakeCloud {
    transition_polls: u32,
    describe_delays: HashMap<Target, Duration>,
    state: Mutex<State>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            transition_polls: 1,
            describe_delays: HashMap::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Number of id-describes a start/stop takes to be observed
    pub fn with_transition_polls(mut self, polls: u32) -> Self {
        self.transition_polls = polls;
        self
    }

    /// Make describes for `target` take `delay` before answering
    pub fn with_describe_delay(mut self, target: Target, delay: Duration) -> Self {
        self.describe_delays.insert(target, delay);
        self
    }

    pub fn with_instance(self, instance: ComputeInstance) -> Self {
        self.state.lock().unwrap().instances.push(FakeInstance {
            instance,
            transition: None,
        });
        self
    }

    /// Instance currently in `state` that reaches `target` on the `polls`-th describe
    pub fn with_transitioning_instance(
        self,
        instance: ComputeInstance,
        target: InstanceState,
        polls: u32,
    ) -> Self {
        self.state.lock().unwrap().instances.push(FakeInstance {
            instance,
            transition: Some((target, polls)),
        });
        self
    }

    /// Database whose status advances through `statuses`, one per describe
    pub fn with_database(self, db: DatabaseInstance, statuses: &[&str]) -> Self {
        let statuses = statuses.iter().map(|s| s.to_string()).collect();
        self.state.lock().unwrap().databases.push((db, statuses));
        self
    }

    pub fn with_deployment(
        self,
        deployment_id: &str,
        statuses: &[DeploymentStatus],
        summaries: Vec<DeploymentInstanceSummary>,
    ) -> Self {
        self.state.lock().unwrap().deployments.insert(
            deployment_id.to_string(),
            FakeDeployment {
                statuses: statuses.iter().cloned().collect(),
                summaries,
            },
        );
        self
    }

    pub fn with_group(self, info: DeploymentGroupInfo) -> Self {
        let key = (info.application.clone(), info.group_name.clone());
        self.state.lock().unwrap().groups.insert(key, info);
        self
    }

    pub fn failing_modify(self, id: &str) -> Self {
        self.state.lock().unwrap().fail_modify.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn describe_by_id_calls(&self) -> u32 {
        self.state.lock().unwrap().describe_by_id_calls
    }

    pub fn completed_describes(&self) -> Vec<Target> {
        self.state.lock().unwrap().completed_describes.clone()
    }

    pub fn instance(&self, id: &str) -> ComputeInstance {
        self.state
            .lock()
            .unwrap()
            .instances
            .iter()
            .find(|i| i.instance.id == id)
            .map(|i| i.instance.clone())
            .unwrap()
    }

    pub fn group(&self, application: &str, group: &str) -> DeploymentGroupInfo {
        self.state.lock().unwrap().groups[&(application.to_string(), group.to_string())].clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn begin_transition(&self, ids: &[String], via: InstanceState, target: InstanceState) {
        let mut state = self.state.lock().unwrap();
        for fake in state.instances.iter_mut().filter(|i| ids.contains(&i.instance.id)) {
            fake.instance.state = via.clone();
            fake.transition = Some((target.clone(), self.transition_polls));
        }
    }
}

/// Instance with a `Name` tag and optional extra tags
pub fn instance(id: &str, state: InstanceState, name: &str, tags: &[(&str, &str)]) -> ComputeInstance {
    let mut all_tags = vec![Tag::new("Name", name)];
    all_tags.extend(tags.iter().map(|(k, v)| Tag::new(*k, *v)));
    ComputeInstance {
        id: id.to_string(),
        state,
        instance_type: "t3.small".to_string(),
        public_ip: Some("198.51.100.7".to_string()),
        tags: all_tags,
    }
}

#[async_trait]
impl ComputeApi for FakeCloud {
    async fn describe_instances(&self, target: &Target) -> Result<Vec<ComputeInstance>> {
        if let Some(delay) = self.describe_delays.get(target) {
            tokio::time::sleep(*delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.completed_describes.push(target.clone());
        Ok(state
            .instances
            .iter()
            .map(|i| i.instance.clone())
            .filter(|i| match target.tag_filter() {
                None => true,
                Some((key, value)) => i.tags.iter().any(|t| t.key == key && t.value == value),
            })
            .collect())
    }

    async fn describe_instances_by_id(&self, ids: &[String]) -> Result<Vec<ComputeInstance>> {
        let mut state = self.state.lock().unwrap();
        state.describe_by_id_calls += 1;

        let mut found = Vec::new();
        for fake in state.instances.iter_mut().filter(|i| ids.contains(&i.instance.id)) {
            if let Some((target, remaining)) = fake.transition.take() {
                if remaining <= 1 {
                    fake.instance.state = target;
                } else {
                    fake.transition = Some((target, remaining - 1));
                }
            }
            found.push(fake.instance.clone());
        }
        Ok(found)
    }

    async fn start_instances(&self, ids: &[String]) -> Result<()> {
        self.record(format!("start {}", ids.join(",")));
        self.begin_transition(ids, InstanceState::Pending, InstanceState::Running);
        Ok(())
    }

    async fn stop_instances(&self, ids: &[String]) -> Result<()> {
        self.record(format!("stop {}", ids.join(",")));
        self.begin_transition(ids, InstanceState::Stopping, InstanceState::Stopped);
        Ok(())
    }

    async fn reboot_instances(&self, ids: &[String]) -> Result<()> {
        self.record(format!("reboot {}", ids.join(",")));
        Ok(())
    }

    async fn modify_instance_type(&self, id: &str, instance_type: &str) -> Result<()> {
        self.record(format!("modify {id} {instance_type}"));
        let mut state = self.state.lock().unwrap();
        if state.fail_modify.contains(id) {
            return Err(CloudError::api(
                "ec2",
                "ModifyInstanceAttribute",
                "InvalidInstanceType",
            ));
        }
        let fake = state
            .instances
            .iter_mut()
            .find(|i| i.instance.id == id)
            .ok_or_else(|| CloudError::InstanceNotFound(id.to_string()))?;
        if fake.instance.state != InstanceState::Stopped {
            return Err(CloudError::api(
                "ec2",
                "ModifyInstanceAttribute",
                "IncorrectInstanceState",
            ));
        }
        fake.instance.instance_type = instance_type.to_string();
        Ok(())
    }
}

#[async_trait]
impl DatabaseApi for FakeCloud {
    async fn describe_db_instances(
        &self,
        identifier: Option<&str>,
    ) -> Result<Vec<DatabaseInstance>> {
        let mut state = self.state.lock().unwrap();
        let mut found = Vec::new();
        for (db, statuses) in state.databases.iter_mut() {
            if identifier.is_some_and(|id| id != db.identifier) {
                continue;
            }
            if statuses.len() > 1 {
                db.status = statuses.pop_front().unwrap();
            } else if let Some(last) = statuses.front() {
                db.status = last.clone();
            }
            found.push(db.clone());
        }

        if identifier.is_some() && found.is_empty() {
            return Err(CloudError::api(
                "rds",
                "DescribeDBInstances",
                "DBInstanceNotFound",
            ));
        }
        Ok(found)
    }

    async fn start_db_instance(&self, identifier: &str) -> Result<()> {
        self.record(format!("start-db {identifier}"));
        Ok(())
    }

    async fn stop_db_instance(&self, identifier: &str) -> Result<()> {
        self.record(format!("stop-db {identifier}"));
        Ok(())
    }

    async fn reboot_db_instance(&self, identifier: &str) -> Result<()> {
        self.record(format!("reboot-db {identifier}"));
        Ok(())
    }

    async fn modify_db_instance_class(&self, identifier: &str, class: &str) -> Result<()> {
        self.record(format!("modify-db {identifier} {class}"));
        Ok(())
    }
}

#[async_trait]
impl DeploymentApi for FakeCloud {
    async fn create_deployment(
        &self,
        application: &str,
        group: &str,
        _revision: &Revision,
    ) -> Result<String> {
        self.record(format!("create-deployment {application} {group}"));
        let mut state = self.state.lock().unwrap();
        state.created_deployments += 1;
        Ok(format!("d-{}", state.created_deployments))
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<DeploymentStatus> {
        let mut state = self.state.lock().unwrap();
        let deployment = state
            .deployments
            .get_mut(deployment_id)
            .ok_or_else(|| CloudError::api("codedeploy", "GetDeployment", "DeploymentDoesNotExist"))?;
        if deployment.statuses.len() > 1 {
            Ok(deployment.statuses.pop_front().unwrap())
        } else {
            Ok(deployment
                .statuses
                .front()
                .cloned()
                .unwrap_or(DeploymentStatus::Created))
        }
    }

    async fn list_deployment_instances(&self, deployment_id: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .deployments
            .get(deployment_id)
            .map(|d| d.summaries.iter().map(|s| s.instance_id.clone()).collect())
            .unwrap_or_default())
    }

    async fn batch_get_deployment_instances(
        &self,
        deployment_id: &str,
        instance_ids: &[String],
    ) -> Result<Vec<DeploymentInstanceSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .deployments
            .get(deployment_id)
            .map(|d| {
                d.summaries
                    .iter()
                    .filter(|s| instance_ids.contains(&s.instance_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_deployment_group(
        &self,
        application: &str,
        group: &str,
    ) -> Result<DeploymentGroupInfo> {
        let state = self.state.lock().unwrap();
        state
            .groups
            .get(&(application.to_string(), group.to_string()))
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("{application}/{group}")))
    }

    async fn update_deployment_group_filter(
        &self,
        application: &str,
        group: &str,
        filters: &[TagFilter],
    ) -> Result<()> {
        self.record(format!("update-group {application} {group}"));
        let mut state = self.state.lock().unwrap();
        let info = state
            .groups
            .get_mut(&(application.to_string(), group.to_string()))
            .ok_or_else(|| CloudError::NotFound(format!("{application}/{group}")))?;
        info.ec2_tag_filters = filters.to_vec();
        Ok(())
    }
}

fn key_matches(item: &Item, key: &Item) -> bool {
    key.iter().all(|(k, v)| item.get(k) == Some(v))
}

#[async_trait]
impl KeyValueApi for FakeCloud {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().tables.keys().cloned().collect())
    }

    async fn put_item(&self, table: &str, item: &Item) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let items = state.tables.entry(table.to_string()).or_default();
        // The fake keys every table on "id".
        items.retain(|existing| existing.get("id") != item.get("id"));
        items.push(item.clone());
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .get(table)
            .and_then(|items| items.iter().find(|i| key_matches(i, key)).cloned()))
    }

    async fn delete_item(&self, table: &str, key: &Item) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(items) = state.tables.get_mut(table) {
            items.retain(|i| !key_matches(i, key));
        }
        Ok(())
    }
}

/// Observer that keeps every event
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn attempt_failures(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::AttemptFailed { .. }))
            .count()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
