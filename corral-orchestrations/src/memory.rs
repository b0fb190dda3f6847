//! In-memory container platform.
//!
//! Implements every client trait against process-local state, speaking the same error
//! vocabulary as the remote APIs. Eventual consistency is scripted: a cluster can be
//! given a sequence of instance counts observed on successive delete attempts, and a
//! registry entry can be held "in use" for a number of delete attempts. Failures can be
//! injected per operation with [`MemoryPlatform::fail_next`].

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use corral_models::{
    merge_tags, parse_template_id, Cluster, ClusterSpec, ClusterStatus, Deployment,
    DeploymentStatus, LogEvent, LogPage, LogQuery, Namespace, Parameter, ParameterSpec,
    RegistryEntry, RegistryEntrySpec, RolloutState, RunTaskRequest, SecretCreateSpec,
    SecretDeletion, SecretHandle, SecretSummary, Service, ServiceChanges, ServiceSpec,
    ServiceStatus, Tag, TaskSummary, TaskTemplate, TaskTemplateSpec, TaskTemplateStatus,
};
use parking_lot::Mutex;

use crate::classify::{logs, parameters, platform, registry, secrets};
use crate::clients::{
    ClusterApi, LogEventApi, ParameterApi, RegistryApi, RemoteResult, SecretApi, ServiceApi,
    TaskTemplateApi,
};
use crate::error::RemoteError;

/// Remote operations, for fault injection and attempt counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateCluster,
    DescribeCluster,
    DeleteCluster,
    ListClusterServices,
    RegisterTaskTemplate,
    DescribeTaskTemplate,
    DeregisterTaskTemplate,
    ListTaskTemplateRevisions,
    TagTaskTemplate,
    RunTask,
    CreateService,
    UpdateService,
    DeleteService,
    DescribeService,
    ListServices,
    TagService,
    CreateRegistryEntry,
    GetRegistryEntry,
    DeleteRegistryEntry,
    GetNamespace,
    CreateSecret,
    UpdateSecret,
    DeleteSecret,
    DescribeSecret,
    ListSecrets,
    PutParameter,
    GetParameter,
    DeleteParameter,
    ListParameters,
    GetLogEvents,
}

struct ClusterRecord {
    cluster: Cluster,
    /// Instance counts reported by successive delete attempts
    drain: VecDeque<u32>,
}

struct EntryRecord {
    entry: RegistryEntry,
    /// Delete attempts that still report the entry in use
    busy_attempts: u32,
}

struct SecretRecord {
    summary: SecretSummary,
    value: String,
    version: u64,
}

#[derive(Default)]
struct State {
    clusters: BTreeMap<String, ClusterRecord>,
    templates: BTreeMap<String, Vec<TaskTemplate>>,
    services: BTreeMap<(String, String), Service>,
    entries: BTreeMap<String, EntryRecord>,
    namespaces: BTreeMap<String, Namespace>,
    secrets: BTreeMap<String, SecretRecord>,
    parameters: BTreeMap<String, Parameter>,
    log_streams: BTreeMap<(String, String), Vec<LogEvent>>,
    tasks: Vec<TaskSummary>,
    faults: VecDeque<Fault>,
    attempts: HashMap<Operation, u32>,
    journal: Vec<String>,
    sequence: u64,
}

/// Scripted failure of one call to `op`, after `skip` successful calls
#[derive(Debug)]
struct Fault {
    op: Operation,
    skip: u32,
    err: RemoteError,
}

fn vendor(code: &str, message: impl Into<String>) -> RemoteError {
    RemoteError::vendor(code, message)
}

impl State {
    fn begin(&mut self, op: Operation) -> RemoteResult<()> {
        *self.attempts.entry(op).or_insert(0) += 1;
        let Some(idx) = self.faults.iter().position(|f| f.op == op) else {
            return Ok(());
        };
        if self.faults[idx].skip > 0 {
            self.faults[idx].skip -= 1;
            return Ok(());
        }
        match self.faults.remove(idx) {
            Some(fault) => Err(fault.err),
            None => Ok(()),
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn record(&mut self, entry: String) {
        self.journal.push(entry);
    }

    // ---- clusters -------------------------------------------------------

    fn create_cluster(&mut self, spec: &ClusterSpec) -> RemoteResult<Cluster> {
        if spec.name.is_empty() {
            return Err(vendor(platform::INVALID_PARAMETER, "Cluster name can not be empty."));
        }
        if let Some(existing) = self.clusters.get(&spec.name) {
            if existing.cluster.status == ClusterStatus::Active {
                // creation is idempotent for active clusters
                return Ok(existing.cluster.clone());
            }
        }

        let cluster = Cluster {
            name: spec.name.clone(),
            arn: format!("arn:corral:cluster/{}", spec.name),
            status: ClusterStatus::Active,
            registered_instances_count: 0,
            running_tasks_count: 0,
            pending_tasks_count: 0,
            active_services_count: 0,
            capacity_providers: spec.capacity_providers.clone(),
            tags: spec.tags.clone(),
        };
        self.clusters.insert(
            spec.name.clone(),
            ClusterRecord {
                cluster: cluster.clone(),
                drain: VecDeque::new(),
            },
        );
        self.record(format!("create_cluster:{}", spec.name));
        Ok(cluster)
    }

    fn active_cluster(&self, name: &str) -> RemoteResult<&ClusterRecord> {
        match self.clusters.get(name) {
            Some(record) if record.cluster.status == ClusterStatus::Active => Ok(record),
            _ => Err(vendor(platform::CLUSTER_NOT_FOUND, "Cluster not found.")),
        }
    }

    fn delete_cluster(&mut self, name: &str) -> RemoteResult<Cluster> {
        self.active_cluster(name)?;
        let services = self.services.keys().filter(|(c, _)| c == name).count();

        let Some(record) = self.clusters.get_mut(name) else {
            return Err(vendor(platform::CLUSTER_NOT_FOUND, "Cluster not found."));
        };
        if services > 0 {
            return Err(vendor(
                platform::CLUSTER_CONTAINS_SERVICES,
                "The Cluster cannot be deleted while Services are active.",
            ));
        }
        if let Some(observed) = record.drain.pop_front() {
            record.cluster.registered_instances_count = observed;
        }
        if record.cluster.registered_instances_count > 0 {
            return Err(vendor(
                platform::CLUSTER_CONTAINS_INSTANCES,
                "The Cluster cannot be deleted while Container Instances are active or draining.",
            ));
        }

        record.cluster.status = ClusterStatus::Inactive;
        let cluster = record.cluster.clone();
        self.record(format!("delete_cluster:{}", name));
        Ok(cluster)
    }

    // ---- task templates -------------------------------------------------

    fn template(&self, id: &str) -> RemoteResult<&TaskTemplate> {
        let (family, revision) = parse_template_id(id);
        let revisions = self.templates.get(family);
        let found = match (revisions, revision) {
            (Some(revs), Some(rev)) => revs.iter().find(|t| t.revision == rev),
            (Some(revs), None) => revs
                .iter()
                .rev()
                .find(|t| t.status == TaskTemplateStatus::Active),
            (None, _) => None,
        };
        found.ok_or_else(|| {
            vendor(
                platform::RESOURCE_NOT_FOUND,
                format!("Unable to describe task template {}.", id),
            )
        })
    }

    fn active_template(&self, id: &str) -> RemoteResult<&TaskTemplate> {
        let template = self.template(id)?;
        if template.status != TaskTemplateStatus::Active {
            return Err(vendor(
                platform::INVALID_PARAMETER,
                format!("TaskTemplate {} is inactive.", id),
            ));
        }
        Ok(template)
    }

    fn register(&mut self, spec: &TaskTemplateSpec) -> RemoteResult<TaskTemplate> {
        if spec.family.is_empty() {
            return Err(vendor(platform::CLIENT, "Family can not be blank."));
        }
        if spec.containers.is_empty() {
            return Err(vendor(platform::CLIENT, "Container list cannot be empty."));
        }
        if let Some(name) = spec.duplicate_container_name() {
            return Err(vendor(
                platform::CLIENT,
                format!("Duplicate container name found: {}.", name),
            ));
        }
        if spec.cpu.parse::<u32>().is_err() {
            return Err(vendor(platform::CLIENT, "Invalid 'cpu' setting for task."));
        }
        if spec.memory.parse::<u32>().is_err() {
            return Err(vendor(platform::CLIENT, "Invalid 'memory' setting for task."));
        }

        let revisions = self.templates.entry(spec.family.clone()).or_default();
        let revision = revisions.len() as u32 + 1;
        let template = TaskTemplate {
            family: spec.family.clone(),
            revision,
            arn: format!("arn:corral:task-template/{}:{}", spec.family, revision),
            status: TaskTemplateStatus::Active,
            cpu: spec.cpu.clone(),
            memory: spec.memory.clone(),
            network_mode: spec.network_mode.clone(),
            execution_role: spec.execution_role.clone(),
            containers: spec.containers.clone(),
            tags: spec.tags.clone(),
        };
        revisions.push(template.clone());
        self.record(format!("register:{}", template.id()));
        Ok(template)
    }

    fn deregister(&mut self, id: &str) -> RemoteResult<TaskTemplate> {
        let (family, revision) = parse_template_id(id);
        let Some(revision) = revision else {
            return Err(vendor(
                platform::CLIENT,
                "A revision must be specified to deregister a task template.",
            ));
        };
        let template = self
            .templates
            .get_mut(family)
            .and_then(|revs| revs.iter_mut().find(|t| t.revision == revision))
            .ok_or_else(|| {
                vendor(
                    platform::RESOURCE_NOT_FOUND,
                    format!("Unable to describe task template {}.", id),
                )
            })?;
        template.status = TaskTemplateStatus::Inactive;
        let template = template.clone();
        self.record(format!("deregister:{}", id));
        Ok(template)
    }

    fn list_revisions(&self, family: &str) -> Vec<String> {
        self.templates
            .get(family)
            .map(|revs| {
                revs.iter()
                    .filter(|t| t.status == TaskTemplateStatus::Active)
                    .map(TaskTemplate::id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn tag_template(&mut self, id: &str, tags: &[Tag]) -> RemoteResult<()> {
        let (family, revision) = parse_template_id(id);
        let template = self
            .templates
            .get_mut(family)
            .and_then(|revs| match revision {
                Some(rev) => revs.iter_mut().find(|t| t.revision == rev),
                None => revs.last_mut(),
            })
            .ok_or_else(|| {
                vendor(
                    platform::RESOURCE_NOT_FOUND,
                    format!("Unable to describe task template {}.", id),
                )
            })?;
        template.tags = merge_tags(&template.tags, tags);
        Ok(())
    }

    fn run_task(&mut self, request: &RunTaskRequest) -> RemoteResult<Vec<TaskSummary>> {
        self.active_cluster(&request.cluster)?;
        let template_id = self.active_template(&request.task_template)?.id();
        if request.count == 0 || request.count > 10 {
            return Err(vendor(
                platform::INVALID_PARAMETER,
                "count must be between 1 and 10.",
            ));
        }

        let mut tasks = Vec::new();
        for _ in 0..request.count {
            let seq = self.next_seq();
            tasks.push(TaskSummary {
                arn: format!("arn:corral:task/{}/{:08x}", request.cluster, seq),
                cluster: request.cluster.clone(),
                task_template: template_id.clone(),
                last_status: "PROVISIONING".to_string(),
                desired_status: "RUNNING".to_string(),
                started_by: request.started_by.clone(),
                created_at: Utc::now(),
            });
        }
        self.tasks.extend(tasks.iter().cloned());
        self.record(format!("run_task:{}:{}", request.cluster, request.count));
        Ok(tasks)
    }

    // ---- services -------------------------------------------------------

    fn create_service(&mut self, spec: &ServiceSpec) -> RemoteResult<Service> {
        let cluster = spec.cluster.clone().unwrap_or_default();
        self.active_cluster(&cluster)?;
        let Some(template_id) = spec.task_template.as_deref() else {
            return Err(vendor(platform::INVALID_PARAMETER, "TaskTemplate can not be blank."));
        };
        let template = self.active_template(template_id)?;
        let template_id = template.id();
        if template.network_mode == "awsvpc"
            && spec.network.as_ref().map_or(true, |n| n.subnets.is_empty())
        {
            return Err(vendor(
                platform::INVALID_PARAMETER,
                "subnets can not be empty.",
            ));
        }
        for arn in &spec.registry_arns {
            if !self.entries.values().any(|e| &e.entry.arn == arn) {
                return Err(vendor(
                    platform::INVALID_PARAMETER,
                    format!("Registry {} does not exist.", arn),
                ));
            }
        }
        let key = (cluster.clone(), spec.name.clone());
        if self.services.contains_key(&key) {
            return Err(vendor(
                platform::INVALID_PARAMETER,
                "Creation of service was not idempotent.",
            ));
        }

        let seq = self.next_seq();
        let service = Service {
            name: spec.name.clone(),
            arn: format!("arn:corral:service/{}/{}", cluster, spec.name),
            cluster: cluster.clone(),
            status: ServiceStatus::Active,
            desired_count: spec.desired_count,
            running_count: 0,
            pending_count: spec.desired_count,
            task_template: template_id.clone(),
            registry_arns: spec.registry_arns.clone(),
            network: spec.network.clone(),
            capacity_provider_strategy: spec.capacity_provider_strategy.clone(),
            launch_type: spec.launch_type.clone(),
            platform_version: spec.platform_version.clone(),
            deployments: vec![Deployment {
                id: format!("ecs-svc/{:016}", seq),
                status: DeploymentStatus::Primary,
                rollout_state: RolloutState::InProgress,
                task_template: template_id,
                desired_count: spec.desired_count,
                running_count: 0,
                pending_count: spec.desired_count,
            }],
            tags: spec.tags.clone(),
            created_at: Utc::now(),
        };
        self.services.insert(key, service.clone());
        if let Some(record) = self.clusters.get_mut(&cluster) {
            record.cluster.active_services_count += 1;
        }
        self.record(format!("create_service:{}/{}", cluster, spec.name));
        Ok(service)
    }

    fn service_mut(&mut self, cluster: &str, name: &str) -> RemoteResult<&mut Service> {
        if !self.clusters.contains_key(cluster) {
            return Err(vendor(platform::CLUSTER_NOT_FOUND, "Cluster not found."));
        }
        self.services
            .get_mut(&(cluster.to_string(), name.to_string()))
            .ok_or_else(|| vendor(platform::SERVICE_NOT_FOUND, "Service not found."))
    }

    fn update_service(
        &mut self,
        cluster: &str,
        name: &str,
        changes: &ServiceChanges,
    ) -> RemoteResult<Service> {
        let new_template = match &changes.task_template {
            Some(id) => Some(self.active_template(id)?.id()),
            None => None,
        };
        let seq = self.next_seq();
        let service = self.service_mut(cluster, name)?;
        if service.status != ServiceStatus::Active {
            return Err(vendor(platform::SERVICE_NOT_ACTIVE, "Service was not ACTIVE."));
        }

        if let Some(count) = changes.desired_count {
            service.desired_count = count;
        }
        if let Some(strategy) = &changes.capacity_provider_strategy {
            service.capacity_provider_strategy = strategy.clone();
        }
        if let Some(network) = &changes.network {
            service.network = Some(network.clone());
        }

        let template_changed = new_template
            .as_ref()
            .is_some_and(|id| *id != service.task_template);
        if let Some(id) = new_template {
            service.task_template = id;
        }
        if template_changed || changes.force_new_deployment {
            for deployment in &mut service.deployments {
                if deployment.status == DeploymentStatus::Primary {
                    deployment.status = DeploymentStatus::Active;
                }
            }
            service.deployments.insert(
                0,
                Deployment {
                    id: format!("ecs-svc/{:016}", seq),
                    status: DeploymentStatus::Primary,
                    rollout_state: RolloutState::InProgress,
                    task_template: service.task_template.clone(),
                    desired_count: service.desired_count,
                    running_count: 0,
                    pending_count: service.desired_count,
                },
            );
        } else if let Some(primary) = service
            .deployments
            .iter_mut()
            .find(|d| d.status == DeploymentStatus::Primary)
        {
            primary.desired_count = service.desired_count;
        }

        let service = service.clone();
        self.record(format!("update_service:{}/{}", cluster, name));
        Ok(service)
    }

    fn delete_service(&mut self, cluster: &str, name: &str, force: bool) -> RemoteResult<Service> {
        let service = self.service_mut(cluster, name)?;
        if !force && service.desired_count > 0 {
            return Err(vendor(
                platform::INVALID_PARAMETER,
                "The service cannot be stopped while it is scaled above 0.",
            ));
        }

        let mut service = self
            .services
            .remove(&(cluster.to_string(), name.to_string()))
            .ok_or_else(|| vendor(platform::SERVICE_NOT_FOUND, "Service not found."))?;
        service.status = ServiceStatus::Draining;
        if let Some(record) = self.clusters.get_mut(cluster) {
            record.cluster.active_services_count =
                record.cluster.active_services_count.saturating_sub(1);
        }
        self.record(format!("delete_service:{}/{}", cluster, name));
        Ok(service)
    }

    fn describe_service(&mut self, cluster: &str, name: &str) -> RemoteResult<Service> {
        let service = self.service_mut(cluster, name)?;
        // every observation converges the rollout
        service.running_count = service.desired_count;
        service.pending_count = 0;
        for deployment in &mut service.deployments {
            if deployment.status == DeploymentStatus::Primary {
                deployment.running_count = deployment.desired_count;
                deployment.pending_count = 0;
                deployment.rollout_state = RolloutState::Completed;
            }
        }
        service.deployments.retain(|d| d.status == DeploymentStatus::Primary);
        Ok(service.clone())
    }

    // ---- registry -------------------------------------------------------

    fn create_entry(&mut self, spec: &RegistryEntrySpec) -> RemoteResult<RegistryEntry> {
        if !self.namespaces.contains_key(&spec.namespace_id) {
            return Err(vendor(registry::NAMESPACE_NOT_FOUND, "Namespace not found."));
        }
        if self.entries.values().any(|e| {
            e.entry.name == spec.name && e.entry.namespace_id.as_deref() == Some(&spec.namespace_id)
        }) {
            return Err(vendor(
                registry::SERVICE_ALREADY_EXISTS,
                format!("Service {} already exists.", spec.name),
            ));
        }

        let seq = self.next_seq();
        let id = format!("srv-{:012}", seq);
        let entry = RegistryEntry {
            id: id.clone(),
            arn: format!("arn:corral:registry/{}", id),
            name: spec.name.clone(),
            namespace_id: Some(spec.namespace_id.clone()),
            description: spec.description.clone(),
        };
        self.entries.insert(
            id.clone(),
            EntryRecord {
                entry: entry.clone(),
                busy_attempts: 0,
            },
        );
        self.record(format!("create_entry:{}", id));
        Ok(entry)
    }

    fn entry_id(&self, id_or_arn: &str) -> Option<String> {
        if self.entries.contains_key(id_or_arn) {
            return Some(id_or_arn.to_string());
        }
        self.entries
            .values()
            .find(|e| e.entry.arn == id_or_arn)
            .map(|e| e.entry.id.clone())
    }

    fn get_entry(&self, id: &str) -> RemoteResult<RegistryEntry> {
        self.entry_id(id)
            .and_then(|id| self.entries.get(&id))
            .map(|e| e.entry.clone())
            .ok_or_else(|| vendor(registry::SERVICE_NOT_FOUND, "Service not found."))
    }

    fn delete_entry(&mut self, id: &str) -> RemoteResult<()> {
        let id = self
            .entry_id(id)
            .ok_or_else(|| vendor(registry::SERVICE_NOT_FOUND, "Service not found."))?;
        let arn = self.entries[&id].entry.arn.clone();
        if self.services.values().any(|s| s.registry_arns.contains(&arn)) {
            return Err(vendor(registry::RESOURCE_IN_USE, "Service contains registered instances."));
        }
        if let Some(record) = self.entries.get_mut(&id) {
            if record.busy_attempts > 0 {
                record.busy_attempts -= 1;
                return Err(vendor(
                    registry::RESOURCE_IN_USE,
                    "Service contains registered instances.",
                ));
            }
        }
        self.entries.remove(&id);
        self.record(format!("delete_entry:{}", id));
        Ok(())
    }

    // ---- secrets --------------------------------------------------------

    fn secret_arn(&self, id: &str) -> Option<String> {
        if self.secrets.contains_key(id) {
            return Some(id.to_string());
        }
        self.secrets
            .values()
            .find(|s| s.summary.name == id)
            .map(|s| s.summary.arn.clone())
    }

    fn live_secret_mut(&mut self, id: &str) -> RemoteResult<&mut SecretRecord> {
        let arn = self.secret_arn(id).ok_or_else(|| {
            vendor(
                secrets::RESOURCE_NOT_FOUND,
                "Secrets Manager can't find the specified secret.",
            )
        })?;
        let record = self.secrets.get_mut(&arn).ok_or_else(|| {
            vendor(
                secrets::RESOURCE_NOT_FOUND,
                "Secrets Manager can't find the specified secret.",
            )
        })?;
        if record.summary.deletion_date.is_some() {
            return Err(vendor(
                secrets::INVALID_REQUEST,
                "You can't perform this operation on the secret because it was marked for deletion.",
            ));
        }
        Ok(record)
    }

    fn create_secret(&mut self, spec: &SecretCreateSpec) -> RemoteResult<SecretHandle> {
        if spec.name.is_empty() {
            return Err(vendor(secrets::INVALID_PARAMETER, "Name must not be empty."));
        }
        if let Some(existing) = self.secrets.values().find(|s| s.summary.name == spec.name) {
            return Err(if existing.summary.deletion_date.is_some() {
                vendor(
                    secrets::INVALID_REQUEST,
                    "A secret with this name is already scheduled for deletion.",
                )
            } else {
                vendor(
                    secrets::RESOURCE_EXISTS,
                    format!("The secret {} already exists.", spec.name),
                )
            });
        }

        let seq = self.next_seq();
        let arn = format!("arn:corral:secret:{}-{:06}", spec.name, seq);
        self.secrets.insert(
            arn.clone(),
            SecretRecord {
                summary: SecretSummary {
                    arn: arn.clone(),
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    tags: spec.tags.clone(),
                    last_changed: Utc::now(),
                    deletion_date: None,
                },
                value: spec.secret_string.clone(),
                version: 1,
            },
        );
        self.record(format!("create_secret:{}", spec.name));
        Ok(SecretHandle {
            arn,
            name: spec.name.clone(),
            version_id: "v1".to_string(),
        })
    }

    fn update_secret(&mut self, id: &str, value: &str) -> RemoteResult<SecretHandle> {
        let record = self.live_secret_mut(id)?;
        record.value = value.to_string();
        record.version += 1;
        record.summary.last_changed = Utc::now();
        let handle = SecretHandle {
            arn: record.summary.arn.clone(),
            name: record.summary.name.clone(),
            version_id: format!("v{}", record.version),
        };
        self.record(format!("update_secret:{}", handle.arn));
        Ok(handle)
    }

    fn delete_secret(&mut self, id: &str, grace_window_days: u32) -> RemoteResult<SecretDeletion> {
        if grace_window_days != 0 && !(7..=30).contains(&grace_window_days) {
            return Err(vendor(
                secrets::INVALID_PARAMETER,
                "The recovery window must be between 7 and 30 days.",
            ));
        }
        let record = self.live_secret_mut(id)?;
        let arn = record.summary.arn.clone();
        let deletion_date = Utc::now() + ChronoDuration::days(i64::from(grace_window_days));

        if grace_window_days == 0 {
            self.secrets.remove(&arn);
        } else {
            record.summary.deletion_date = Some(deletion_date);
        }
        self.record(format!("delete_secret:{}", arn));
        Ok(SecretDeletion { arn, deletion_date })
    }

    fn describe_secret(&self, id: &str) -> RemoteResult<SecretSummary> {
        self.secret_arn(id)
            .and_then(|arn| self.secrets.get(&arn))
            .map(|s| s.summary.clone())
            .ok_or_else(|| {
                vendor(
                    secrets::RESOURCE_NOT_FOUND,
                    "Secrets Manager can't find the specified secret.",
                )
            })
    }

    // ---- parameters -----------------------------------------------------

    fn put_parameter(&mut self, spec: &ParameterSpec, overwrite: bool) -> RemoteResult<Parameter> {
        if !spec.name.starts_with('/') {
            return Err(vendor(
                parameters::PARAMETER_PATTERN_MISMATCH,
                "Parameter name must be a fully qualified name.",
            ));
        }
        let version = match self.parameters.get(&spec.name) {
            Some(_) if !overwrite => {
                return Err(vendor(
                    parameters::PARAMETER_ALREADY_EXISTS,
                    "The parameter already exists.",
                ))
            }
            Some(existing) => existing.version + 1,
            None => 1,
        };
        let parameter = Parameter {
            name: spec.name.clone(),
            value: spec.value.clone(),
            version,
            secure: spec.secure,
            last_modified: Utc::now(),
        };
        self.parameters.insert(spec.name.clone(), parameter.clone());
        self.record(format!("put_parameter:{}", spec.name));
        Ok(parameter)
    }

    fn get_parameter(&self, name: &str) -> RemoteResult<Parameter> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| vendor(parameters::PARAMETER_NOT_FOUND, "Parameter not found."))
    }

    fn delete_parameter(&mut self, name: &str) -> RemoteResult<()> {
        self.parameters
            .remove(name)
            .ok_or_else(|| vendor(parameters::PARAMETER_NOT_FOUND, "Parameter not found."))?;
        self.record(format!("delete_parameter:{}", name));
        Ok(())
    }

    // ---- logs -----------------------------------------------------------

    fn get_log_events(&self, query: &LogQuery) -> RemoteResult<LogPage> {
        let group = query.log_group();
        if !self.log_streams.keys().any(|(g, _)| *g == group) {
            return Err(vendor(
                logs::RESOURCE_NOT_FOUND,
                "The specified log group does not exist.",
            ));
        }
        let events = self
            .log_streams
            .get(&(group, query.log_stream()))
            .ok_or_else(|| {
                vendor(
                    logs::RESOURCE_NOT_FOUND,
                    "The specified log stream does not exist.",
                )
            })?;

        let in_range: Vec<&LogEvent> = events
            .iter()
            .filter(|e| query.start_time.map_or(true, |t| e.timestamp >= t))
            .filter(|e| query.end_time.map_or(true, |t| e.timestamp < t))
            .collect();
        let limit = query.limit.unwrap_or(100).max(1);
        let total = in_range.len();

        let (start, end) = match query.next_token.as_deref() {
            Some(token) => {
                let (direction, index) = token.split_once('/').ok_or_else(|| {
                    vendor(logs::INVALID_PARAMETER, "The specified nextToken is invalid.")
                })?;
                let index: usize = index.parse().map_err(|_| {
                    vendor(logs::INVALID_PARAMETER, "The specified nextToken is invalid.")
                })?;
                let index = index.min(total);
                match direction {
                    "f" => (index, (index + limit).min(total)),
                    "b" => (index.saturating_sub(limit), index),
                    _ => {
                        return Err(vendor(
                            logs::INVALID_PARAMETER,
                            "The specified nextToken is invalid.",
                        ))
                    }
                }
            }
            None if query.start_from_head => (0, limit.min(total)),
            None => (total.saturating_sub(limit), total),
        };

        Ok(LogPage {
            events: in_range[start..end].iter().map(|e| (*e).clone()).collect(),
            next_forward_token: Some(format!("f/{}", end)),
            next_backward_token: Some(format!("b/{}", start)),
        })
    }
}

/// Process-local stand-in for the remote container platform
#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        op: Operation,
        f: impl FnOnce(&mut State) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let mut state = self.state.lock();
        state.begin(op)?;
        f(&mut state)
    }

    // ---- scripting ------------------------------------------------------

    /// Make the next `op` call fail with `err`
    pub fn fail_next(&self, op: Operation, err: RemoteError) {
        self.fail_after(op, 0, err);
    }

    /// Let `successes` calls of `op` through, then fail the next one with `err`
    pub fn fail_after(&self, op: Operation, successes: u32, err: RemoteError) {
        self.state.lock().faults.push_back(Fault {
            op,
            skip: successes,
            err,
        });
    }

    /// Make the next `times` calls of `op` fail with `err`
    pub fn fail_times(&self, op: Operation, err: RemoteError, times: usize) {
        let mut state = self.state.lock();
        for _ in 0..times {
            state.faults.push_back(Fault {
                op,
                skip: 0,
                err: err.clone(),
            });
        }
    }

    /// Instance counts successive delete attempts of `cluster` will observe
    pub fn script_instance_drain(&self, cluster: &str, observations: impl IntoIterator<Item = u32>) {
        if let Some(record) = self.state.lock().clusters.get_mut(cluster) {
            record.drain = observations.into_iter().collect();
        }
    }

    pub fn set_registered_instances(&self, cluster: &str, count: u32) {
        if let Some(record) = self.state.lock().clusters.get_mut(cluster) {
            record.cluster.registered_instances_count = count;
            record.drain.clear();
        }
    }

    /// Report the registry entry as in use for the next `attempts` delete calls
    pub fn hold_registry_entry(&self, id: &str, attempts: u32) {
        let mut state = self.state.lock();
        if let Some(id) = state.entry_id(id) {
            if let Some(record) = state.entries.get_mut(&id) {
                record.busy_attempts = attempts;
            }
        }
    }

    pub fn add_namespace(&self, id: &str, name: &str) -> Namespace {
        let namespace = Namespace {
            id: id.to_string(),
            arn: format!("arn:corral:namespace/{}", id),
            name: name.to_string(),
        };
        self.state
            .lock()
            .namespaces
            .insert(id.to_string(), namespace.clone());
        namespace
    }

    /// Insert an entry as-is, bypassing validation
    pub fn insert_registry_entry(&self, entry: RegistryEntry) {
        self.state.lock().entries.insert(
            entry.id.clone(),
            EntryRecord {
                entry,
                busy_attempts: 0,
            },
        );
    }

    pub fn append_log_events(
        &self,
        cluster: &str,
        component: &str,
        instance: &str,
        events: impl IntoIterator<Item = LogEvent>,
    ) {
        self.state
            .lock()
            .log_streams
            .entry((format!("/corral/{}", cluster), format!("{}/{}", component, instance)))
            .or_default()
            .extend(events);
    }

    // ---- inspection -----------------------------------------------------

    /// Successful mutating calls, in order
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().journal.clone()
    }

    /// Calls made to `op`, failed ones included
    pub fn attempts(&self, op: Operation) -> u32 {
        self.state.lock().attempts.get(&op).copied().unwrap_or(0)
    }

    pub fn cluster_exists(&self, name: &str) -> bool {
        self.state.lock().active_cluster(name).is_ok()
    }

    pub fn service_exists(&self, cluster: &str, name: &str) -> bool {
        self.state
            .lock()
            .services
            .contains_key(&(cluster.to_string(), name.to_string()))
    }

    pub fn registry_entry_exists(&self, id: &str) -> bool {
        self.state.lock().entry_id(id).is_some()
    }

    /// Active revisions of `family`
    pub fn active_revisions(&self, family: &str) -> Vec<String> {
        self.state.lock().list_revisions(family)
    }

    /// Secrets not scheduled for deletion
    pub fn live_secrets(&self) -> Vec<SecretSummary> {
        self.state
            .lock()
            .secrets
            .values()
            .filter(|s| s.summary.deletion_date.is_none())
            .map(|s| s.summary.clone())
            .collect()
    }

    pub fn secret_value(&self, id: &str) -> Option<String> {
        let state = self.state.lock();
        state
            .secret_arn(id)
            .and_then(|arn| state.secrets.get(&arn))
            .map(|s| s.value.clone())
    }
}

#[async_trait]
impl ClusterApi for MemoryPlatform {
    async fn create_cluster(&self, spec: &ClusterSpec) -> RemoteResult<Cluster> {
        self.with_state(Operation::CreateCluster, |s| s.create_cluster(spec))
    }

    async fn describe_cluster(&self, name: &str) -> RemoteResult<Cluster> {
        self.with_state(Operation::DescribeCluster, |s| {
            s.active_cluster(name).map(|r| r.cluster.clone())
        })
    }

    async fn delete_cluster(&self, name: &str) -> RemoteResult<Cluster> {
        self.with_state(Operation::DeleteCluster, |s| s.delete_cluster(name))
    }

    async fn list_service_names(&self, cluster: &str) -> RemoteResult<Vec<String>> {
        self.with_state(Operation::ListClusterServices, |s| {
            s.active_cluster(cluster)?;
            Ok(s.services
                .keys()
                .filter(|(c, _)| c == cluster)
                .map(|(_, n)| n.clone())
                .collect())
        })
    }
}

#[async_trait]
impl TaskTemplateApi for MemoryPlatform {
    async fn register(&self, spec: &TaskTemplateSpec) -> RemoteResult<TaskTemplate> {
        self.with_state(Operation::RegisterTaskTemplate, |s| s.register(spec))
    }

    async fn describe(&self, id: &str) -> RemoteResult<TaskTemplate> {
        self.with_state(Operation::DescribeTaskTemplate, |s| s.template(id).cloned())
    }

    async fn deregister(&self, id: &str) -> RemoteResult<TaskTemplate> {
        self.with_state(Operation::DeregisterTaskTemplate, |s| s.deregister(id))
    }

    async fn list_revisions(&self, family: &str) -> RemoteResult<Vec<String>> {
        self.with_state(Operation::ListTaskTemplateRevisions, |s| {
            Ok(s.list_revisions(family))
        })
    }

    async fn tag(&self, id: &str, tags: &[Tag]) -> RemoteResult<()> {
        self.with_state(Operation::TagTaskTemplate, |s| s.tag_template(id, tags))
    }

    async fn run_task(&self, request: &RunTaskRequest) -> RemoteResult<Vec<TaskSummary>> {
        self.with_state(Operation::RunTask, |s| s.run_task(request))
    }
}

#[async_trait]
impl ServiceApi for MemoryPlatform {
    async fn create_service(&self, spec: &ServiceSpec) -> RemoteResult<Service> {
        self.with_state(Operation::CreateService, |s| s.create_service(spec))
    }

    async fn update_service(
        &self,
        cluster: &str,
        name: &str,
        changes: &ServiceChanges,
    ) -> RemoteResult<Service> {
        self.with_state(Operation::UpdateService, |s| {
            s.update_service(cluster, name, changes)
        })
    }

    async fn delete_service(
        &self,
        cluster: &str,
        name: &str,
        force: bool,
    ) -> RemoteResult<Service> {
        self.with_state(Operation::DeleteService, |s| {
            s.delete_service(cluster, name, force)
        })
    }

    async fn describe_service(&self, cluster: &str, name: &str) -> RemoteResult<Service> {
        self.with_state(Operation::DescribeService, |s| s.describe_service(cluster, name))
    }

    async fn list_services(&self, cluster: &str) -> RemoteResult<Vec<Service>> {
        self.with_state(Operation::ListServices, |s| {
            s.active_cluster(cluster)?;
            Ok(s.services
                .iter()
                .filter(|((c, _), _)| c == cluster)
                .map(|(_, svc)| svc.clone())
                .collect())
        })
    }

    async fn tag_service(&self, cluster: &str, name: &str, tags: &[Tag]) -> RemoteResult<()> {
        self.with_state(Operation::TagService, |s| {
            let service = s.service_mut(cluster, name)?;
            service.tags = merge_tags(&service.tags, tags);
            Ok(())
        })
    }
}

#[async_trait]
impl RegistryApi for MemoryPlatform {
    async fn create_entry(&self, spec: &RegistryEntrySpec) -> RemoteResult<RegistryEntry> {
        self.with_state(Operation::CreateRegistryEntry, |s| s.create_entry(spec))
    }

    async fn get_entry(&self, id: &str) -> RemoteResult<RegistryEntry> {
        self.with_state(Operation::GetRegistryEntry, |s| s.get_entry(id))
    }

    async fn delete_entry(&self, id: &str) -> RemoteResult<()> {
        self.with_state(Operation::DeleteRegistryEntry, |s| s.delete_entry(id))
    }

    async fn get_namespace(&self, id: &str) -> RemoteResult<Namespace> {
        self.with_state(Operation::GetNamespace, |s| {
            s.namespaces
                .get(id)
                .cloned()
                .ok_or_else(|| vendor(registry::NAMESPACE_NOT_FOUND, "Namespace not found."))
        })
    }
}

#[async_trait]
impl SecretApi for MemoryPlatform {
    async fn create_secret(&self, spec: &SecretCreateSpec) -> RemoteResult<SecretHandle> {
        self.with_state(Operation::CreateSecret, |s| s.create_secret(spec))
    }

    async fn update_secret(&self, id: &str, secret_string: &str) -> RemoteResult<SecretHandle> {
        self.with_state(Operation::UpdateSecret, |s| s.update_secret(id, secret_string))
    }

    async fn delete_secret(
        &self,
        id: &str,
        grace_window_days: u32,
    ) -> RemoteResult<SecretDeletion> {
        self.with_state(Operation::DeleteSecret, |s| {
            s.delete_secret(id, grace_window_days)
        })
    }

    async fn describe_secret(&self, id: &str) -> RemoteResult<SecretSummary> {
        self.with_state(Operation::DescribeSecret, |s| s.describe_secret(id))
    }

    async fn list_secrets(&self, filter: &[Tag]) -> RemoteResult<Vec<SecretSummary>> {
        self.with_state(Operation::ListSecrets, |s| {
            Ok(s.secrets
                .values()
                .filter(|r| filter.iter().all(|t| r.summary.tags.contains(t)))
                .map(|r| r.summary.clone())
                .collect())
        })
    }
}

#[async_trait]
impl ParameterApi for MemoryPlatform {
    async fn put_parameter(&self, spec: &ParameterSpec, overwrite: bool) -> RemoteResult<Parameter> {
        self.with_state(Operation::PutParameter, |s| s.put_parameter(spec, overwrite))
    }

    async fn get_parameter(&self, name: &str) -> RemoteResult<Parameter> {
        self.with_state(Operation::GetParameter, |s| s.get_parameter(name))
    }

    async fn delete_parameter(&self, name: &str) -> RemoteResult<()> {
        self.with_state(Operation::DeleteParameter, |s| s.delete_parameter(name))
    }

    async fn list_parameters(&self, prefix: &str) -> RemoteResult<Vec<Parameter>> {
        self.with_state(Operation::ListParameters, |s| {
            Ok(s.parameters
                .range(prefix.to_string()..)
                .take_while(|(name, _)| name.starts_with(prefix))
                .map(|(_, p)| p.clone())
                .collect())
        })
    }
}

#[async_trait]
impl LogEventApi for MemoryPlatform {
    async fn get_log_events(&self, query: &LogQuery) -> RemoteResult<LogPage> {
        self.with_state(Operation::GetLogEvents, |s| s.get_log_events(query))
    }
}
