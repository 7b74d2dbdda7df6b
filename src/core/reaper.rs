use crate::core::expiry::is_expired;
use crate::core::pagination::MAXIMUM_RESULTS_PER_PAGE;
use crate::domain::model::{Service, ServiceInstance, ServicePlan};
use crate::domain::ports::{CloudController, Clock, FetchStream, ReportSink};
use crate::utils::error::{PipelineError, ReaperError, Result, Stage};
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What one reap run looks for and what it does with expired instances.
#[derive(Debug, Clone)]
pub struct ReapOptions {
    pub service_name: String,
    pub expiry_interval: Duration,
    /// Delete expired instances. Otherwise only report them.
    pub reap: bool,
    /// Also delete bindings, keys and routes of reaped instances.
    pub recursive: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReapSummary {
    pub expired: usize,
    pub deleted: usize,
}

/// Finds expired instances of a service's free plans and deletes or reports them.
///
/// A run is four concurrent stages (source, plan filter, instance filter,
/// sink) joined by bounded channels. Every stage pushes its failures onto one
/// shared error channel; the run fails iff that channel received anything.
pub struct Reaper<C: CloudController> {
    cf: Arc<C>,
    clock: Arc<dyn Clock>,
    report: Arc<dyn ReportSink>,
    buffer: usize,
}

impl<C: CloudController + 'static> Reaper<C> {
    pub fn new(cf: Arc<C>, clock: Arc<dyn Clock>, report: Arc<dyn ReportSink>) -> Self {
        Self {
            cf,
            clock,
            report,
            buffer: MAXIMUM_RESULTS_PER_PAGE,
        }
    }

    /// Capacity of the channels between stages; normally the API page size.
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    pub async fn reap(&self, options: ReapOptions) -> Result<ReapSummary> {
        tracing::info!(
            service = %options.service_name,
            reap = options.reap,
            recursive = options.recursive,
            "Starting reap pipeline"
        );

        let (error_tx, mut error_rx) = mpsc::channel::<PipelineError>(self.buffer);

        let (services_tx, services_rx) = mpsc::channel(1);
        let source = tokio::spawn(services_with_name(
            Arc::clone(&self.cf),
            Arc::clone(&self.report),
            options.service_name.clone(),
            services_tx,
            error_tx.clone(),
        ));

        let (plans_tx, plans_rx) = mpsc::channel(self.buffer);
        let plan_filter = tokio::spawn(free_plans_of(
            Arc::clone(&self.cf),
            services_rx,
            plans_tx,
            error_tx.clone(),
        ));

        let (instances_tx, instances_rx) = mpsc::channel(self.buffer);
        let instance_filter = tokio::spawn(expired_instances_of(
            Arc::clone(&self.cf),
            Arc::clone(&self.clock),
            options.expiry_interval,
            plans_rx,
            instances_tx,
            error_tx.clone(),
        ));

        // The sink takes the last error sender; its exit closes the channel.
        let sink = tokio::spawn(delete(
            Arc::clone(&self.cf),
            Arc::clone(&self.report),
            options.reap,
            options.recursive,
            instances_rx,
            error_tx,
        ));

        let mut error_count = 0usize;
        while let Some(error) = error_rx.recv().await {
            error_count += 1;
            tracing::warn!(stage = %error.stage, "{}", error);
            self.report.line(&error.to_string());
        }

        for (stage, handle) in [
            (Stage::Source, source),
            (Stage::PlanFilter, plan_filter),
            (Stage::InstanceFilter, instance_filter),
        ] {
            if let Err(e) = handle.await {
                error_count += 1;
                self.record_aborted(stage, e);
            }
        }

        let summary = match sink.await {
            Ok(summary) => summary,
            Err(e) => {
                error_count += 1;
                self.record_aborted(Stage::Sink, e);
                ReapSummary::default()
            }
        };

        tracing::info!(
            expired = summary.expired,
            deleted = summary.deleted,
            errors = error_count,
            "Reap pipeline finished"
        );

        if error_count > 0 {
            return Err(ReaperError::ReapFailed { error_count });
        }

        Ok(summary)
    }

    fn record_aborted(&self, stage: Stage, error: tokio::task::JoinError) {
        let error = PipelineError::new(
            stage,
            ReaperError::StageAborted {
                stage,
                message: error.to_string(),
            },
        );
        tracing::error!(stage = %stage, "{}", error);
        self.report.line(&error.to_string());
    }
}

async fn record(errors: &mpsc::Sender<PipelineError>, stage: Stage, error: ReaperError) {
    if errors.send(PipelineError::new(stage, error)).await.is_err() {
        tracing::debug!(stage = %stage, "Error channel closed, dropping error");
    }
}

/// Source stage: emits at most one service, the first match in API order.
async fn services_with_name<C: CloudController>(
    cf: Arc<C>,
    report: Arc<dyn ReportSink>,
    service_name: String,
    output: mpsc::Sender<Service>,
    errors: mpsc::Sender<PipelineError>,
) {
    let services = match cf.list_services_by_name(&service_name).await {
        Ok(services) => services,
        Err(e) => {
            record(&errors, Stage::Source, e).await;
            return;
        }
    };

    if services.len() > 1 {
        tracing::debug!(
            "{} services named '{}', using the first",
            services.len(),
            service_name
        );
    }

    match services.into_iter().next() {
        Some(service) => {
            tracing::info!(service = %service.metadata.id, "Resolved service '{}'", service_name);
            if output.send(service).await.is_err() {
                tracing::debug!("Plan filter went away, dropping service");
            }
        }
        None => report.line(&format!("No services of type '{}' found", service_name)),
    }
}

/// Plan-filter stage: passes on free plans only.
async fn free_plans_of<C: CloudController>(
    cf: Arc<C>,
    mut services: mpsc::Receiver<Service>,
    output: mpsc::Sender<ServicePlan>,
    errors: mpsc::Sender<PipelineError>,
) {
    while let Some(service) = services.recv().await {
        let plans = match cf.list_plans(&service.metadata.id).await {
            Ok(plans) => plans,
            Err(e) => {
                record(&errors, Stage::PlanFilter, e).await;
                continue;
            }
        };

        for plan in plans {
            if !plan.is_free {
                tracing::debug!(plan = %plan.metadata.id, "Skipping paid plan '{}'", plan.name);
                continue;
            }
            tracing::debug!(plan = %plan.metadata.id, "Free plan '{}'", plan.name);
            if output.send(plan).await.is_err() {
                return;
            }
        }
    }
}

/// Instance-filter stage: streams each free plan's instances and passes on
/// the expired ones as they are classified.
async fn expired_instances_of<C: CloudController>(
    cf: Arc<C>,
    clock: Arc<dyn Clock>,
    expiry_interval: Duration,
    mut plans: mpsc::Receiver<ServicePlan>,
    output: mpsc::Sender<ServiceInstance>,
    errors: mpsc::Sender<PipelineError>,
) {
    while let Some(plan) = plans.recv().await {
        let FetchStream { mut items, error } = cf.stream_instances(&plan.metadata.id);

        while let Some(instance) = items.recv().await {
            match is_expired(&instance.metadata.created_at, expiry_interval, || clock.now()) {
                Ok(true) => {
                    tracing::debug!(instance = %instance.metadata.id, "Expired: {}", instance.name);
                    if output.send(instance).await.is_err() {
                        return;
                    }
                }
                Ok(false) => {
                    tracing::debug!(instance = %instance.metadata.id, "Not expired: {}", instance.name);
                }
                Err(e) => {
                    record(&errors, Stage::InstanceFilter, e).await;
                    break;
                }
            }
        }

        // Dropping the receiver stops the fetch task at its next send, so the
        // error channel below always closes.
        drop(items);
        if let Ok(e) = error.await {
            record(&errors, Stage::InstanceFilter, e).await;
        }
    }
}

/// Sink stage: deletes (in reap mode) and reports every expired instance.
async fn delete<C: CloudController>(
    cf: Arc<C>,
    report: Arc<dyn ReportSink>,
    reap: bool,
    recursive: bool,
    mut instances: mpsc::Receiver<ServiceInstance>,
    errors: mpsc::Sender<PipelineError>,
) -> ReapSummary {
    let mut summary = ReapSummary::default();

    while let Some(instance) = instances.recv().await {
        summary.expired += 1;

        if reap {
            match cf.delete_instance(&instance.metadata.id, recursive).await {
                Ok(()) => summary.deleted += 1,
                Err(e) => {
                    let error = ReaperError::DeleteFailed {
                        name: instance.name.clone(),
                        id: instance.metadata.id.clone(),
                        source: Box::new(e),
                    };
                    record(&errors, Stage::Sink, error).await;
                }
            }
        }

        report.line(&format!("{} {}", instance.name, instance.metadata.id));
    }

    drop(errors);
    summary
}
