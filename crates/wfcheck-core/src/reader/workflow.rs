use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;

use super::{join, unknown_fields_message, ErrorSink};
use crate::error::{ObjectClass, RootError, SchemaError};
use crate::model::{
    ActionSpecifier, EventConfig, InputType, Job, RunStep, RunsOn, Scalar, Step, StepsJob,
    UsesJob, UsesStep, Workflow, WorkflowInput, WorkflowSpecifier,
};
use crate::yaml::{canonical_string, is_string_like, key_string, on_block, value_kind};

/// Result of reading a workflow document: a best-effort model plus every
/// schema violation reachable in the tree.
#[derive(Debug)]
pub struct WorkflowRead {
    pub workflow: Workflow,
    pub errors: Vec<SchemaError>,
}

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_a-z][_\-a-z0-9]+$").unwrap());

const WORKFLOW_FIELDS: &[&str] = &[
    "concurrency",
    "defaults",
    "env",
    "jobs",
    "name",
    "on",
    "permissions",
    "run-name",
];

const JOB_FIELDS: &[&str] = &[
    "concurrency",
    "container",
    "continue-on-error",
    "defaults",
    "env",
    "environment",
    "if",
    "name",
    "needs",
    "outputs",
    "permissions",
    "runs-on",
    "secrets",
    "services",
    "steps",
    "strategy",
    "timeout-minutes",
    "uses",
    "with",
];

const STEP_FIELDS: &[&str] = &[
    "continue-on-error",
    "env",
    "id",
    "if",
    "name",
    "run",
    "shell",
    "timeout-minutes",
    "uses",
    "with",
    "working-directory",
];

const CONTAINER_FIELDS: &[&str] = &[
    "credentials",
    "env",
    "image",
    "options",
    "ports",
    "volumes",
];

const STRATEGY_FIELDS: &[&str] = &["fail-fast", "matrix", "max-parallel"];

const PULL_REQUEST_FIELDS: &[&str] =
    &["branches", "branches-ignore", "paths", "paths-ignore", "types"];

const PUSH_FIELDS: &[&str] = &[
    "branches",
    "branches-ignore",
    "paths",
    "paths-ignore",
    "tags",
    "tags-ignore",
];

const ON_SHAPE_MESSAGE: &str = "Must be an array or map of workflow triggering events";

/// Whether an id satisfies the job/step id grammar.
pub fn is_valid_id(id: &str) -> bool {
    ID_RE.is_match(id)
}

/// Read a workflow document into a typed model.
///
/// Structural violations are accumulated as [`SchemaError`] values; the
/// only raising conditions are unparseable YAML and a non-map root.
pub fn read_workflow(src: &str) -> Result<WorkflowRead, RootError> {
    let root: Value = serde_yaml::from_str(src)?;
    let map = match root {
        Value::Mapping(map) => map,
        other => {
            return Err(RootError::NotAMap {
                kind: value_kind(&other),
                document: "workflow",
            })
        }
    };

    let mut sink = ErrorSink::new();

    for key in map.keys() {
        let Some(name) = key_string(key) else {
            continue;
        };
        if !WORKFLOW_FIELDS.contains(&name.as_str()) {
            sink.push(
                ObjectClass::Workflow,
                name.clone(),
                unknown_fields_message("workflow field", vec![name]),
            );
        }
    }

    let name = read_string_like_field(&map, "name", "", ObjectClass::Workflow, &mut sink);
    if let Some(env) = map.get("env") {
        read_env(env, "env", ObjectClass::Workflow, &mut sink);
    }
    if let Some(defaults) = map.get("defaults") {
        check_defaults(defaults, "defaults", ObjectClass::Workflow, &mut sink);
    }

    let on = read_on(on_block(&map), &mut sink);
    let jobs = read_jobs(map.get("jobs"), &mut sink);

    Ok(WorkflowRead {
        workflow: Workflow {
            path: None,
            name,
            on,
            jobs,
        },
        errors: sink.into_errors(),
    })
}

fn read_on(value: Option<&Value>, sink: &mut ErrorSink) -> Vec<EventConfig> {
    let mut events = Vec::new();
    let Some(value) = value else {
        sink.push(ObjectClass::Event, "on", ON_SHAPE_MESSAGE);
        return events;
    };

    match value {
        Value::Sequence(seq) => {
            for (i, item) in seq.iter().enumerate() {
                if is_string_like(item) {
                    let name = canonical_string(item).unwrap();
                    match empty_event(&name) {
                        Some(event) => events.push(event),
                        None => push_unknown_event(&name, sink),
                    }
                } else {
                    sink.push(
                        ObjectClass::Event,
                        format!("on[{i}]"),
                        "Workflow trigger event name must be a string",
                    );
                }
            }
        }
        Value::Mapping(map) => {
            for (key, config) in map {
                let Some(name) = key_string(key) else {
                    continue;
                };
                if empty_event(&name).is_none() {
                    push_unknown_event(&name, sink);
                    continue;
                }
                if let Some(event) = read_event(&name, config, sink) {
                    events.push(event);
                }
            }
        }
        _ => sink.push(ObjectClass::Event, "on", ON_SHAPE_MESSAGE),
    }

    events
}

fn push_unknown_event(name: &str, sink: &mut ErrorSink) {
    sink.push(
        ObjectClass::Event,
        join("on", name),
        format!("`{name}` is not a valid workflow trigger event name"),
    );
}

fn empty_event(name: &str) -> Option<EventConfig> {
    match name {
        "pull_request" => Some(EventConfig::PullRequest),
        "push" => Some(EventConfig::Push),
        "workflow_call" => Some(EventConfig::WorkflowCall {
            inputs: IndexMap::new(),
        }),
        "workflow_dispatch" => Some(EventConfig::WorkflowDispatch {
            inputs: IndexMap::new(),
        }),
        _ => None,
    }
}

fn read_event(name: &str, config: &Value, sink: &mut ErrorSink) -> Option<EventConfig> {
    let path = join("on", name);

    if config.is_null() {
        return empty_event(name);
    }
    let Some(map) = config.as_mapping() else {
        sink.push(
            ObjectClass::Event,
            path,
            format!("`{name}` event configuration must be a map"),
        );
        return empty_event(name);
    };

    let whitelist: &[&str] = match name {
        "pull_request" => PULL_REQUEST_FIELDS,
        "push" => PUSH_FIELDS,
        "workflow_call" => &["inputs", "outputs", "secrets"],
        "workflow_dispatch" => &["inputs"],
        _ => unreachable!("event name checked by caller"),
    };
    check_unknown_keys(
        map,
        whitelist,
        &path,
        ObjectClass::Event,
        &format!("`{name}` event field"),
        sink,
    );

    match name {
        "pull_request" => Some(EventConfig::PullRequest),
        "push" => Some(EventConfig::Push),
        "workflow_call" | "workflow_dispatch" => {
            let inputs = match map.get("inputs") {
                Some(value) => collect_inputs(name, value, sink),
                None => IndexMap::new(),
            };
            if name == "workflow_call" {
                Some(EventConfig::WorkflowCall { inputs })
            } else {
                Some(EventConfig::WorkflowDispatch { inputs })
            }
        }
        _ => unreachable!("event name checked by caller"),
    }
}

fn collect_inputs(
    event: &str,
    value: &Value,
    sink: &mut ErrorSink,
) -> IndexMap<String, WorkflowInput> {
    let base = format!("on.{event}.inputs");
    let mut inputs = IndexMap::new();

    let Some(map) = value.as_mapping() else {
        sink.push(
            ObjectClass::Input,
            base,
            "`inputs` must be a map of workflow inputs",
        );
        return inputs;
    };

    for (key, body) in map {
        let Some(id) = key_string(key) else {
            continue;
        };
        let path = join(&base, &id);
        if let Some(input) = read_input(event, body, &path, sink) {
            inputs.insert(id, input);
        }
    }

    inputs
}

fn read_input(
    event: &str,
    body: &Value,
    path: &str,
    sink: &mut ErrorSink,
) -> Option<WorkflowInput> {
    let Some(map) = body.as_mapping() else {
        sink.push(ObjectClass::Input, path, "Input must be a map");
        return None;
    };

    let allowed_types: &[&str] = if event == "workflow_dispatch" {
        &["boolean", "number", "string", "choice", "environment"]
    } else {
        &["boolean", "number", "string"]
    };

    let type_name = match map.get("type") {
        Some(value) => match value.as_str() {
            Some(name) if allowed_types.contains(&name) => name.to_string(),
            Some(name) => {
                sink.push(
                    ObjectClass::Input,
                    join(path, "type"),
                    format!("`{name}` is not a valid `{event}` input type"),
                );
                return None;
            }
            None => {
                sink.push(
                    ObjectClass::Input,
                    join(path, "type"),
                    "`type` must be a string",
                );
                return None;
            }
        },
        None => {
            sink.push(
                ObjectClass::Input,
                join(path, "type"),
                "Input must declare a `type`",
            );
            return None;
        }
    };

    let mut known = vec!["default", "description", "required", "type"];
    if type_name == "choice" {
        known.push("options");
    }
    check_unknown_keys(map, &known, path, ObjectClass::Input, "input field", sink);

    let description = match map.get("description") {
        None => None,
        Some(value) => match value.as_str() {
            Some(text) => Some(text.to_string()),
            None => {
                sink.push(
                    ObjectClass::Input,
                    join(path, "description"),
                    "`description` must be a string",
                );
                None
            }
        },
    };

    let required = match map.get("required") {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            sink.push(
                ObjectClass::Input,
                join(path, "required"),
                "`required` must be a boolean",
            );
            None
        }
    };

    let ty = match type_name.as_str() {
        "boolean" => InputType::Boolean {
            default: match map.get("default") {
                None | Some(Value::Null) => None,
                Some(Value::Bool(b)) => Some(*b),
                Some(_) => {
                    sink.push(
                        ObjectClass::Input,
                        join(path, "default"),
                        "`default` must be a boolean",
                    );
                    None
                }
            },
        },
        "number" => InputType::Number {
            default: match map.get("default") {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => n.as_f64(),
                Some(_) => {
                    sink.push(
                        ObjectClass::Input,
                        join(path, "default"),
                        "`default` must be a number",
                    );
                    None
                }
            },
        },
        "string" => InputType::String {
            default: read_string_default(map, path, sink),
        },
        "environment" => InputType::Environment {
            default: read_string_default(map, path, sink),
        },
        "choice" => read_choice(map, path, sink)?,
        _ => unreachable!("type name restricted above"),
    };

    Some(WorkflowInput {
        description,
        required,
        ty,
    })
}

fn read_string_default(map: &Mapping, path: &str, sink: &mut ErrorSink) -> Option<String> {
    match map.get("default") {
        None | Some(Value::Null) => None,
        Some(value) if is_string_like(value) => canonical_string(value),
        Some(_) => {
            sink.push(
                ObjectClass::Input,
                join(path, "default"),
                "`default` must be a string",
            );
            None
        }
    }
}

fn read_choice(map: &Mapping, path: &str, sink: &mut ErrorSink) -> Option<InputType> {
    let options = match map.get("options") {
        None | Some(Value::Null) => {
            sink.push(ObjectClass::Input, path, "Choice input must have `options`");
            return None;
        }
        Some(Value::Sequence(seq)) => {
            let mut options = Vec::new();
            for (i, item) in seq.iter().enumerate() {
                if is_string_like(item) {
                    options.push(canonical_string(item).unwrap());
                } else {
                    sink.push(
                        ObjectClass::Input,
                        format!("{path}.options[{i}]"),
                        "Choice option must be a string",
                    );
                }
            }
            if options.is_empty() {
                sink.push(
                    ObjectClass::Input,
                    join(path, "options"),
                    "`options` must not be empty",
                );
                return None;
            }
            options
        }
        Some(_) => {
            sink.push(
                ObjectClass::Input,
                join(path, "options"),
                "`options` must be an array of strings",
            );
            return None;
        }
    };

    let default = match map.get("default") {
        None | Some(Value::Null) => None,
        Some(value) if is_string_like(value) => {
            let choice = canonical_string(value).unwrap();
            if options.contains(&choice) {
                Some(choice)
            } else {
                sink.push(
                    ObjectClass::Input,
                    join(path, "default"),
                    format!("`{choice}` is not an input option"),
                );
                None
            }
        }
        Some(_) => {
            sink.push(
                ObjectClass::Input,
                join(path, "default"),
                "`default` must be a string",
            );
            None
        }
    };

    Some(InputType::Choice { options, default })
}

fn read_jobs(value: Option<&Value>, sink: &mut ErrorSink) -> IndexMap<String, Job> {
    let mut jobs = IndexMap::new();

    let Some(value) = value else {
        sink.push(ObjectClass::Workflow, "jobs", "No jobs defined in `jobs`");
        return jobs;
    };
    let Some(map) = value.as_mapping() else {
        sink.push(
            ObjectClass::Workflow,
            "jobs",
            "`jobs` must be a map of job configurations",
        );
        return jobs;
    };
    if map.is_empty() {
        sink.push(ObjectClass::Workflow, "jobs", "No jobs defined in `jobs`");
        return jobs;
    }

    for (key, body) in map {
        let Some(id) = key_string(key) else {
            continue;
        };
        if !ID_RE.is_match(&id) {
            sink.push(
                ObjectClass::Job,
                join("jobs", &id),
                format!("`{id}` is not a valid job id"),
            );
            continue;
        }
        if let Some(job) = read_job(&id, body, sink) {
            jobs.insert(id, job);
        }
    }

    jobs
}

fn read_job(id: &str, body: &Value, sink: &mut ErrorSink) -> Option<Job> {
    let path = join("jobs", id);

    let Some(map) = body.as_mapping() else {
        sink.push(ObjectClass::Job, path, "Job must be a map");
        return None;
    };

    for key in map.keys() {
        let Some(name) = key_string(key) else {
            continue;
        };
        if !JOB_FIELDS.contains(&name.as_str()) {
            sink.push(
                ObjectClass::Job,
                join(&path, &name),
                unknown_fields_message("job field", vec![name]),
            );
        }
    }

    if let Some(defaults) = map.get("defaults") {
        check_defaults(defaults, &join(&path, "defaults"), ObjectClass::Job, sink);
    }
    if let Some(container) = map.get("container") {
        check_container(container, &join(&path, "container"), sink);
    }
    if let Some(services) = map.get("services") {
        check_services(services, &join(&path, "services"), sink);
    }
    if let Some(strategy) = map.get("strategy") {
        check_strategy(strategy, &join(&path, "strategy"), sink);
    }

    let has_steps = map.get("steps").is_some();
    let has_uses = map.get("uses").is_some();
    if has_steps && has_uses {
        sink.push(
            ObjectClass::Job,
            path,
            "Job cannot define both `steps` and `uses`",
        );
        return None;
    }
    if !has_steps && !has_uses {
        sink.push(ObjectClass::Job, path, "Job must define `steps` or `uses`");
        return None;
    }

    let name = read_string_like_field(map, "name", &path, ObjectClass::Job, sink);
    let if_cond = read_string_like_field(map, "if", &path, ObjectClass::Job, sink);
    let needs = match map.get("needs") {
        Some(value) => read_needs(value, &join(&path, "needs"), sink),
        None => Vec::new(),
    };

    if has_steps {
        let runs_on = match map.get("runs-on") {
            Some(value) => read_runs_on(value, &join(&path, "runs-on"), sink)?,
            None => {
                sink.push(
                    ObjectClass::Job,
                    path,
                    "Job with `steps` must define `runs-on`",
                );
                return None;
            }
        };
        let env = match map.get("env") {
            Some(value) => read_env(value, &join(&path, "env"), ObjectClass::Job, sink),
            None => IndexMap::new(),
        };
        let steps = read_steps(map.get("steps").unwrap(), &join(&path, "steps"), sink)?;
        Some(Job::Steps(StepsJob {
            name,
            if_cond,
            needs,
            runs_on,
            env,
            steps,
        }))
    } else {
        if map.get("env").is_some() {
            sink.push(
                ObjectClass::Job,
                join(&path, "env"),
                "`env` is not supported with `uses`",
            );
        }
        if map.get("runs-on").is_some() {
            sink.push(
                ObjectClass::Job,
                join(&path, "runs-on"),
                "`runs-on` is not supported with `uses`",
            );
        }
        let uses = match map.get("uses").unwrap().as_str() {
            Some(raw) => match WorkflowSpecifier::parse(raw) {
                Ok(spec) => spec,
                Err(message) => {
                    sink.push(ObjectClass::Job, join(&path, "uses"), message);
                    return None;
                }
            },
            None => {
                sink.push(ObjectClass::Job, join(&path, "uses"), "`uses` must be a string");
                return None;
            }
        };
        let with = match map.get("with") {
            Some(value) => read_with(value, &join(&path, "with"), ObjectClass::Job, sink),
            None => IndexMap::new(),
        };
        Some(Job::Uses(UsesJob {
            name,
            if_cond,
            needs,
            uses,
            with,
        }))
    }
}

fn read_runs_on(value: &Value, path: &str, sink: &mut ErrorSink) -> Option<RunsOn> {
    match value {
        value if is_string_like(value) => {
            Some(RunsOn::Image(canonical_string(value).unwrap()))
        }
        Value::Sequence(seq) => {
            if seq.is_empty() {
                sink.push(
                    ObjectClass::Job,
                    path,
                    "`runs-on` must not be an empty array",
                );
                return None;
            }
            let labels = read_labels(seq, path, sink);
            if labels.is_empty() {
                return None;
            }
            Some(RunsOn::Labels(labels))
        }
        Value::Mapping(map) => {
            check_unknown_keys(
                map,
                &["group", "labels"],
                path,
                ObjectClass::Job,
                "`runs-on` field",
                sink,
            );
            let group = match map.get("group") {
                Some(value) if is_string_like(value) => canonical_string(value).unwrap(),
                Some(_) => {
                    sink.push(
                        ObjectClass::Job,
                        join(path, "group"),
                        "`group` must be a string",
                    );
                    return None;
                }
                None => {
                    sink.push(
                        ObjectClass::Job,
                        path,
                        "`runs-on` map must have a `group`",
                    );
                    return None;
                }
            };
            let labels = match map.get("labels") {
                None => Vec::new(),
                Some(value) if is_string_like(value) => {
                    vec![canonical_string(value).unwrap()]
                }
                Some(Value::Sequence(seq)) => {
                    read_labels(seq, &join(path, "labels"), sink)
                }
                Some(_) => {
                    sink.push(
                        ObjectClass::Job,
                        join(path, "labels"),
                        "`labels` must be a string or an array of strings",
                    );
                    Vec::new()
                }
            };
            Some(RunsOn::Group { group, labels })
        }
        _ => {
            sink.push(
                ObjectClass::Job,
                path,
                "`runs-on` must be a string, an array of strings, or a `{group, labels}` map",
            );
            None
        }
    }
}

fn read_labels(seq: &[Value], path: &str, sink: &mut ErrorSink) -> Vec<String> {
    let mut labels = Vec::new();
    for (i, item) in seq.iter().enumerate() {
        if is_string_like(item) {
            labels.push(canonical_string(item).unwrap());
        } else {
            sink.push(
                ObjectClass::Job,
                format!("{path}[{i}]"),
                "Runner label must be a string",
            );
        }
    }
    labels
}

fn read_steps(value: &Value, path: &str, sink: &mut ErrorSink) -> Option<Vec<Step>> {
    let Some(seq) = value.as_sequence() else {
        sink.push(ObjectClass::Job, path, "`steps` must be an array of steps");
        return None;
    };
    if seq.is_empty() {
        sink.push(ObjectClass::Job, path, "`steps` must not be empty");
        return None;
    }

    let mut steps = Vec::new();
    for (i, item) in seq.iter().enumerate() {
        if let Some(step) = read_step(item, &format!("{path}[{i}]"), sink) {
            steps.push(step);
        }
    }
    if steps.is_empty() {
        return None;
    }
    Some(steps)
}

fn read_step(value: &Value, path: &str, sink: &mut ErrorSink) -> Option<Step> {
    let Some(map) = value.as_mapping() else {
        sink.push(ObjectClass::Step, path, "Step must be a map");
        return None;
    };

    for key in map.keys() {
        let Some(name) = key_string(key) else {
            continue;
        };
        if !STEP_FIELDS.contains(&name.as_str()) {
            sink.push(
                ObjectClass::Step,
                join(path, &name),
                unknown_fields_message("step field", vec![name]),
            );
        }
    }

    let has_run = map.get("run").is_some();
    let has_uses = map.get("uses").is_some();
    if has_run && has_uses {
        sink.push(
            ObjectClass::Step,
            path,
            "Step cannot define both `run` and `uses`",
        );
        return None;
    }
    if !has_run && !has_uses {
        sink.push(ObjectClass::Step, path, "Step must define `run` or `uses`");
        return None;
    }

    let id = match map.get("id") {
        None => None,
        Some(value) => match value.as_str() {
            Some(id) if ID_RE.is_match(id) => Some(id.to_string()),
            Some(id) => {
                sink.push(
                    ObjectClass::Step,
                    join(path, "id"),
                    format!("`{id}` is not a valid step id"),
                );
                None
            }
            None => {
                sink.push(ObjectClass::Step, join(path, "id"), "`id` must be a string");
                None
            }
        },
    };
    let name = read_string_like_field(map, "name", path, ObjectClass::Step, sink);
    let if_cond = read_string_like_field(map, "if", path, ObjectClass::Step, sink);

    if has_run {
        let run = match map.get("run") {
            Some(value) if is_string_like(value) => canonical_string(value).unwrap(),
            _ => {
                sink.push(ObjectClass::Step, join(path, "run"), "`run` must be a string");
                return None;
            }
        };
        let env = match map.get("env") {
            Some(value) => read_env(value, &join(path, "env"), ObjectClass::Step, sink),
            None => IndexMap::new(),
        };
        Some(Step::Run(RunStep {
            id,
            name,
            if_cond,
            run,
            env,
        }))
    } else {
        if map.get("env").is_some() {
            sink.push(
                ObjectClass::Step,
                join(path, "env"),
                "`env` is not supported with `uses`",
            );
        }
        let uses = match map.get("uses").unwrap().as_str() {
            Some(raw) => match ActionSpecifier::parse(raw) {
                Ok(spec) => spec,
                Err(message) => {
                    sink.push(ObjectClass::Step, join(path, "uses"), message);
                    return None;
                }
            },
            None => {
                sink.push(ObjectClass::Step, join(path, "uses"), "`uses` must be a string");
                return None;
            }
        };
        let with = match map.get("with") {
            Some(value) => read_with(value, &join(path, "with"), ObjectClass::Step, sink),
            None => IndexMap::new(),
        };
        Some(Step::Uses(UsesStep {
            id,
            name,
            if_cond,
            uses,
            with,
        }))
    }
}

fn read_needs(value: &Value, path: &str, sink: &mut ErrorSink) -> Vec<String> {
    match value {
        value if is_string_like(value) => vec![canonical_string(value).unwrap()],
        Value::Sequence(seq) => {
            let mut needs = Vec::new();
            for (i, item) in seq.iter().enumerate() {
                if is_string_like(item) {
                    needs.push(canonical_string(item).unwrap());
                } else {
                    sink.push(
                        ObjectClass::Job,
                        format!("{path}[{i}]"),
                        "Job id in `needs` must be a string",
                    );
                }
            }
            needs
        }
        _ => {
            sink.push(
                ObjectClass::Job,
                path,
                "`needs` must be a string or an array of strings",
            );
            Vec::new()
        }
    }
}

fn read_env(
    value: &Value,
    path: &str,
    class: ObjectClass,
    sink: &mut ErrorSink,
) -> IndexMap<String, String> {
    let mut env = IndexMap::new();
    let Some(map) = value.as_mapping() else {
        sink.push(class, path, "`env` must be a map of strings");
        return env;
    };
    for (key, value) in map {
        let Some(name) = key_string(key) else {
            continue;
        };
        if is_string_like(value) {
            env.insert(name, canonical_string(value).unwrap());
        } else {
            sink.push(
                class,
                join(path, &name),
                format!("`{name}` value must be a string"),
            );
        }
    }
    env
}

fn read_with(
    value: &Value,
    path: &str,
    class: ObjectClass,
    sink: &mut ErrorSink,
) -> IndexMap<String, Scalar> {
    let mut with = IndexMap::new();
    let Some(map) = value.as_mapping() else {
        sink.push(class, path, "`with` must be a map");
        return with;
    };
    for (key, value) in map {
        let Some(name) = key_string(key) else {
            continue;
        };
        match Scalar::from_value(value) {
            Some(scalar) => {
                with.insert(name, scalar);
            }
            None => sink.push(
                class,
                join(path, &name),
                format!("`{name}` value must be a boolean, number, or string"),
            ),
        }
    }
    with
}

fn read_string_like_field(
    map: &Mapping,
    key: &str,
    parent: &str,
    class: ObjectClass,
    sink: &mut ErrorSink,
) -> Option<String> {
    let value = map.get(key)?;
    if is_string_like(value) {
        canonical_string(value)
    } else {
        sink.push(
            class,
            join(parent, key),
            format!("`{key}` must be a string"),
        );
        None
    }
}

fn check_unknown_keys(
    map: &Mapping,
    whitelist: &[&str],
    path: &str,
    class: ObjectClass,
    noun: &str,
    sink: &mut ErrorSink,
) {
    let unknown: Vec<String> = map
        .keys()
        .filter_map(key_string)
        .filter(|k| !whitelist.contains(&k.as_str()))
        .collect();
    if !unknown.is_empty() {
        sink.push(class, path, unknown_fields_message(noun, unknown));
    }
}

fn check_defaults(value: &Value, path: &str, class: ObjectClass, sink: &mut ErrorSink) {
    let Some(map) = value.as_mapping() else {
        sink.push(class, path, "`defaults` must be a map");
        return;
    };
    check_unknown_keys(map, &["run"], path, class, "defaults field", sink);
    if let Some(run) = map.get("run") {
        let run_path = join(path, "run");
        match run.as_mapping() {
            Some(run_map) => check_unknown_keys(
                run_map,
                &["shell", "working-directory"],
                &run_path,
                class,
                "defaults `run` field",
                sink,
            ),
            None => sink.push(class, run_path, "`run` must be a map"),
        }
    }
}

fn check_container(value: &Value, path: &str, sink: &mut ErrorSink) {
    match value {
        value if is_string_like(value) => {}
        Value::Mapping(map) => check_unknown_keys(
            map,
            CONTAINER_FIELDS,
            path,
            ObjectClass::Job,
            "container field",
            sink,
        ),
        _ => sink.push(
            ObjectClass::Job,
            path,
            "`container` must be a string or a map",
        ),
    }
}

fn check_services(value: &Value, path: &str, sink: &mut ErrorSink) {
    let Some(map) = value.as_mapping() else {
        sink.push(ObjectClass::Job, path, "`services` must be a map");
        return;
    };
    for (key, service) in map {
        let Some(name) = key_string(key) else {
            continue;
        };
        check_container(service, &join(path, &name), sink);
    }
}

fn check_strategy(value: &Value, path: &str, sink: &mut ErrorSink) {
    let Some(map) = value.as_mapping() else {
        sink.push(ObjectClass::Job, path, "`strategy` must be a map");
        return;
    };
    check_unknown_keys(
        map,
        STRATEGY_FIELDS,
        path,
        ObjectClass::Job,
        "strategy field",
        sink,
    );
}
