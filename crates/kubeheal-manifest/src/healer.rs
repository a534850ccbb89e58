//! Type-specific healing strategies
//!
//! Each strategy is a pure function from a descriptor (plus the diagnosis
//! that selected it) to a new descriptor and the list of edits applied. The
//! input is never touched: strategies work on a private clone and hand the
//! whole result back, or fail without any partial result escaping.
//!
//! # Strategies
//!
//! | Strategy | Edit |
//! |---|---|
//! | [`heal_oom`] | double `requests.memory`, mirror into `limits.memory` |
//! | [`heal_crash_loop`] | push probe delays out, add a startup probe |
//! | [`heal_image_pull`] | swap in a suggested image or pin `:latest` to `:stable` |
//! | [`heal_pending`] | halve requests down to 256Mi / 100m |
//! | [`heal_probe_failure`] | relax probe delay, timeout and period |

use crate::descriptor::{display_value, ensure_mapping, scalar_text, Descriptor, CONTAINERS_PATH};
use crate::error::HealError;
use crate::quantity;
use kubeheal_core::{DiagnosisResult, FailureType, HealingStrategy, Modification, SkippedField};
use serde_yaml::{Mapping, Value};

const LIVENESS: &str = "livenessProbe";
const READINESS: &str = "readinessProbe";
const STARTUP: &str = "startupProbe";

/// Port used for an added startup probe when the container declares none
pub const DEFAULT_PROBE_PORT: u64 = 8080;

/// Caller-supplied inputs some strategies accept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealOptions {
    /// Replacement image for [`heal_image_pull`]
    pub suggested_image: Option<String>,
}

impl HealOptions {
    /// With suggested image
    #[inline]
    #[must_use]
    pub fn with_suggested_image(mut self, image: impl Into<String>) -> Self {
        self.suggested_image = Some(image.into());
        self
    }
}

/// Result of one strategy run
#[derive(Debug, Clone, PartialEq)]
pub struct HealOutcome {
    /// Healed descriptor
    pub descriptor: Descriptor,
    /// Edits applied, in order
    pub modifications: Vec<Modification>,
    /// Fields left alone because their values did not parse
    pub skipped: Vec<SkippedField>,
}

impl HealOutcome {
    /// Outcome that changes nothing
    #[must_use]
    pub fn unchanged(descriptor: &Descriptor) -> Self {
        Self {
            descriptor: descriptor.clone(),
            modifications: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Signature shared by all strategies
pub type HealFn = fn(&Descriptor, &DiagnosisResult, &HealOptions) -> Result<HealOutcome, HealError>;

/// Fixed lookup from strategy identifier to heal function
#[must_use]
pub fn strategy_fn(strategy: HealingStrategy) -> HealFn {
    match strategy {
        HealingStrategy::IncreaseMemory => heal_oom,
        HealingStrategy::IncreaseStartupTime => heal_crash_loop,
        HealingStrategy::FixImageReference => heal_image_pull,
        HealingStrategy::ReduceRequests => heal_pending,
        HealingStrategy::AdjustProbes => heal_probe_failure,
        HealingStrategy::NoOp => heal_identity,
    }
}

/// Heal a descriptor with the strategy bound to `failure_type`
pub fn heal(
    failure_type: FailureType,
    descriptor: &Descriptor,
    diagnosis: &DiagnosisResult,
    options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    let strategy = HealingStrategy::for_failure(failure_type);
    tracing::debug!(%failure_type, %strategy, "dispatching heal strategy");
    strategy_fn(strategy)(descriptor, diagnosis, options)
}

/// Identity strategy for failures without a known edit
pub fn heal_identity(
    descriptor: &Descriptor,
    diagnosis: &DiagnosisResult,
    _options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    tracing::warn!(failure_type = %diagnosis.failure_type, "no healing strategy, leaving descriptor unchanged");
    Ok(HealOutcome::unchanged(descriptor))
}

/// Heal OOMKilled: double memory requests and mirror them into limits
pub fn heal_oom(
    descriptor: &Descriptor,
    _diagnosis: &DiagnosisResult,
    _options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    edit_containers(descriptor, |container, scope| {
        let Some(old) = resource_value(container, "requests", "memory") else {
            return Ok(());
        };
        let field = "resources.requests.memory";
        let Some(old_text) = scalar_text(&old) else {
            scope.skip(field, display_value(&old), "not a scalar");
            return Ok(());
        };
        let new = match quantity::double_memory(&old_text) {
            Ok(new) => new,
            Err(e) => {
                scope.skip(field, old_text, e.to_string());
                return Ok(());
            }
        };

        set_resource(container, "requests", "memory", &new, scope)?;
        set_resource(container, "limits", "memory", &new, scope)?;
        scope.record(field, old_text, new);
        Ok(())
    })
}

/// Heal CrashLoopBackOff: give the application more time to start
pub fn heal_crash_loop(
    descriptor: &Descriptor,
    _diagnosis: &DiagnosisResult,
    _options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    edit_containers(descriptor, |container, scope| {
        if ![LIVENESS, READINESS, STARTUP].iter().any(|p| container.contains_key(*p)) {
            return Ok(());
        }

        bump_probe_field(container, LIVENESS, "initialDelaySeconds", ProbeBump::new(30, 30, 120), scope);
        bump_probe_field(container, READINESS, "initialDelaySeconds", ProbeBump::new(10, 20, 60), scope);

        if !container.contains_key(STARTUP) {
            let probe = startup_probe(container);
            container.insert(Value::from(STARTUP), probe);
            scope.record(STARTUP, "none", "added");
        }
        Ok(())
    })
}

/// Heal ImagePullBackOff: use the suggested image, or pin `:latest` to `:stable`
pub fn heal_image_pull(
    descriptor: &Descriptor,
    _diagnosis: &DiagnosisResult,
    options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    let suggested = options.suggested_image.as_deref().filter(|s| !s.is_empty());

    edit_containers(descriptor, |container, scope| {
        let old = container.get("image").and_then(Value::as_str).map(str::to_string);
        let new = match (suggested, old.as_deref()) {
            (Some(image), current) if current != Some(image) => image.to_string(),
            (Some(_), _) => return Ok(()),
            (None, Some(current)) => match current.strip_suffix(":latest") {
                Some(repository) => format!("{repository}:stable"),
                None => return Ok(()),
            },
            (None, None) => return Ok(()),
        };

        container.insert(Value::from("image"), Value::from(new.as_str()));
        scope.record("image", old.unwrap_or_else(|| "none".to_string()), new);
        Ok(())
    })
}

/// Heal Pending: halve resource requests so the pod fits on a node
pub fn heal_pending(
    descriptor: &Descriptor,
    _diagnosis: &DiagnosisResult,
    _options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    edit_containers(descriptor, |container, scope| {
        reduce_request(container, "memory", quantity::reduce_memory, scope)?;
        reduce_request(container, "cpu", quantity::reduce_cpu, scope)?;
        Ok(())
    })
}

/// Heal ProbeFailure: relax liveness and readiness probe timing
pub fn heal_probe_failure(
    descriptor: &Descriptor,
    _diagnosis: &DiagnosisResult,
    _options: &HealOptions,
) -> Result<HealOutcome, HealError> {
    edit_containers(descriptor, |container, scope| {
        for probe in [LIVENESS, READINESS] {
            bump_probe_field(container, probe, "initialDelaySeconds", ProbeBump::new(10, 15, 60), scope);
            bump_probe_field(container, probe, "timeoutSeconds", ProbeBump::new(1, 2, 10), scope);
            bump_probe_field(container, probe, "periodSeconds", ProbeBump::new(10, 5, 30), scope);
        }
        Ok(())
    })
}

/// Edits collected while walking containers
#[derive(Default)]
struct EditLog {
    modifications: Vec<Modification>,
    skipped: Vec<SkippedField>,
}

/// Per-container view of the edit log
struct ContainerScope<'a> {
    index: usize,
    name: Option<String>,
    log: &'a mut EditLog,
}

impl ContainerScope<'_> {
    fn path(&self, field: &str) -> String {
        format!("{CONTAINERS_PATH}[{}].{field}", self.index)
    }

    fn record(&mut self, field: &str, old: impl Into<String>, new: impl Into<String>) {
        let modification = Modification::new(self.path(field), old, new).in_container(self.name.clone());
        tracing::info!(
            container = self.name.as_deref().unwrap_or("<unnamed>"),
            field = %modification.field,
            old = %modification.old_value,
            new = %modification.new_value,
            "applied edit"
        );
        self.log.modifications.push(modification);
    }

    fn skip(&mut self, field: &str, value: impl Into<String>, reason: impl Into<String>) {
        let skipped = SkippedField::new(self.path(field), value, reason).in_container(self.name.clone());
        tracing::warn!(
            container = self.name.as_deref().unwrap_or("<unnamed>"),
            field = %skipped.field,
            value = %skipped.value,
            reason = %skipped.reason,
            "left field unchanged"
        );
        self.log.skipped.push(skipped);
    }
}

/// Clone the descriptor and run `edit` over every container of the copy
fn edit_containers<F>(descriptor: &Descriptor, mut edit: F) -> Result<HealOutcome, HealError>
where
    F: FnMut(&mut Mapping, &mut ContainerScope<'_>) -> Result<(), HealError>,
{
    let mut working = descriptor.clone();
    let mut log = EditLog::default();

    for (index, container) in working.containers_mut()?.iter_mut().enumerate() {
        let container = container
            .as_mapping_mut()
            .ok_or_else(|| HealError::NotAMapping(format!("{CONTAINERS_PATH}[{index}]")))?;
        let name = container.get("name").and_then(scalar_text);
        let mut scope = ContainerScope {
            index,
            name,
            log: &mut log,
        };
        edit(container, &mut scope)?;
    }

    Ok(HealOutcome {
        descriptor: working,
        modifications: log.modifications,
        skipped: log.skipped,
    })
}

/// `resources.<block>.<key>`, if set to anything but null
fn resource_value(container: &Mapping, block: &str, key: &str) -> Option<Value> {
    container
        .get("resources")?
        .get(block)?
        .get(key)
        .filter(|v| !v.is_null())
        .cloned()
}

fn set_resource(
    container: &mut Mapping,
    block: &str,
    key: &str,
    value: &str,
    scope: &ContainerScope<'_>,
) -> Result<(), HealError> {
    let resources = ensure_mapping(container, "resources", &scope.path("resources"))?;
    let block_map = ensure_mapping(resources, block, &scope.path(&format!("resources.{block}")))?;
    block_map.insert(Value::from(key), Value::from(value));
    Ok(())
}

fn reduce_request(
    container: &mut Mapping,
    key: &str,
    reduce: fn(&str) -> Result<String, quantity::QuantityError>,
    scope: &mut ContainerScope<'_>,
) -> Result<(), HealError> {
    let Some(old) = resource_value(container, "requests", key) else {
        return Ok(());
    };
    let field = format!("resources.requests.{key}");
    let Some(old_text) = scalar_text(&old) else {
        scope.skip(&field, display_value(&old), "not a scalar");
        return Ok(());
    };
    match reduce(&old_text) {
        Ok(new) if new == old_text => Ok(()),
        Ok(new) => {
            set_resource(container, "requests", key, &new, scope)?;
            scope.record(&field, old_text, new);
            Ok(())
        }
        Err(e) => {
            scope.skip(&field, old_text, e.to_string());
            Ok(())
        }
    }
}

/// Default, increment and cap for one integer probe field
#[derive(Debug, Clone, Copy)]
struct ProbeBump {
    default: u64,
    step: u64,
    cap: u64,
}

impl ProbeBump {
    const fn new(default: u64, step: u64, cap: u64) -> Self {
        Self { default, step, cap }
    }
}

/// Raise `<probe>.<field>` by `bump.step`, capped; no-op when the probe is absent
fn bump_probe_field(
    container: &mut Mapping,
    probe: &str,
    field: &str,
    bump: ProbeBump,
    scope: &mut ContainerScope<'_>,
) {
    let Some(probe_map) = container.get_mut(probe).and_then(Value::as_mapping_mut) else {
        return;
    };
    let rel = format!("{probe}.{field}");

    let old = match probe_map.get(field) {
        None | Some(Value::Null) => bump.default,
        Some(value) => match value.as_u64() {
            Some(n) => n,
            None => {
                scope.skip(&rel, display_value(value), "not a non-negative integer");
                return;
            }
        },
    };

    let new = old.saturating_add(bump.step).min(bump.cap);
    if new == old {
        return;
    }
    probe_map.insert(Value::from(field), Value::Number(new.into()));
    scope.record(&rel, old.to_string(), new.to_string());
}

fn startup_probe(container: &Mapping) -> Value {
    let port = container
        .get("ports")
        .and_then(Value::as_sequence)
        .and_then(|ports| ports.first())
        .and_then(|p| p.get("containerPort"))
        .filter(|p| !p.is_null())
        .cloned()
        .unwrap_or_else(|| Value::Number(DEFAULT_PROBE_PORT.into()));

    let mut http_get = Mapping::new();
    http_get.insert(Value::from("path"), Value::from("/health"));
    http_get.insert(Value::from("port"), port);

    let mut probe = Mapping::new();
    probe.insert(Value::from("httpGet"), Value::Mapping(http_get));
    for (key, value) in [
        ("initialDelaySeconds", 0_u64),
        ("periodSeconds", 10),
        ("timeoutSeconds", 3),
        ("failureThreshold", 30),
    ] {
        probe.insert(Value::from(key), Value::Number(value.into()));
    }
    Value::Mapping(probe)
}
