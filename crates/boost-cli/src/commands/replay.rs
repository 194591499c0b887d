//! Scenario replay
//!
//! A script registers profiles, then runs steps against a fresh in-memory
//! service. Each step acts as a named profile, names an operation in its RPC
//! spelling and passes camelCase arguments:
//!
//! ```json
//! {
//!   "profiles": ["admin", "director"],
//!   "steps": [
//!     { "as": "admin", "op": "createBoost", "args": { "name": "Network" }, "bind": "network" },
//!     { "as": "director", "op": "issueBoost",
//!       "args": { "uri": "$network", "recipient": "admin" }, "expect": "UNAUTHORIZED" }
//!   ]
//! }
//! ```
//!
//! `bind` stores a step's result under a name; `$name` or `$name.field` in
//! later arguments refers to it. `expect` names the error code a step must
//! fail with, and `contains` lists fields its result must carry.

use anyhow::{bail, Context, Result};
use boost_claims::NewClaimHook;
use boost_core::{
    BoostConfig, BoostError, BoostResult, BoostUri, CredentialEffects, CredentialPayload,
    CredentialRef, HookId, IdentityEffects, PageRequest, PermissionUpdate, ProfileId,
    SessionToken, SignedCredential,
};
use boost_service::{
    BoostService, BoostServiceConfig, BoostUpdates, CreateBoost, LocalEffects, RecipientQuery,
};
use boost_store::MemoryStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Replay script
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Script {
    /// Profiles registered before the first step
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Steps in order
    pub steps: Vec<Step>,
}

/// One operation in a script
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Step {
    /// Acting profile
    #[serde(rename = "as")]
    pub actor: String,
    /// Operation name, e.g. `createBoost`
    pub op: String,
    /// Operation arguments
    #[serde(default)]
    pub args: Value,
    /// Name to bind the result to
    pub bind: Option<String>,
    /// Error code the step must fail with
    pub expect: Option<String>,
    /// Fields the result must carry
    pub contains: Option<Value>,
}

/// Outcome of one replayed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Step index
    pub step: usize,
    /// Operation name
    pub op: String,
    /// Result, or `{"error": CODE}` for an expected failure
    pub result: Value,
}

/// Runs scripts against one in-memory service
pub struct Replayer {
    service: BoostService<MemoryStore, LocalEffects>,
    sessions: HashMap<String, SessionToken>,
    bindings: HashMap<String, Value>,
}

impl Replayer {
    /// Replayer over a fresh service
    pub fn new(config: BoostServiceConfig) -> Result<Self> {
        let service = BoostService::new(config, MemoryStore::new(), LocalEffects::default())?;
        Ok(Self {
            service,
            sessions: HashMap::new(),
            bindings: HashMap::new(),
        })
    }

    /// Run every step, stopping at the first one that does not go as scripted
    pub async fn run(&mut self, script: &Script) -> Result<Vec<StepReport>> {
        for name in &script.profiles {
            let session = self.session_for(name);
            self.service
                .create_profile(&session, name, None)
                .await
                .with_context(|| format!("registering profile {name}"))?;
        }

        let mut reports = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let report = self
                .run_step(index, step)
                .await
                .with_context(|| format!("step {index} ({}) as {}", step.op, step.actor))?;
            reports.push(report);
        }
        info!(steps = reports.len(), facts = self.service.journal().len(), "replay finished");
        Ok(reports)
    }

    async fn run_step(&mut self, index: usize, step: &Step) -> Result<StepReport> {
        let args = self.substitute(step.args.clone())?;
        let session = self.session_for(&step.actor);
        debug!(index, op = %step.op, actor = %step.actor, "replaying step");

        let result = match (self.dispatch(&session, &step.op, args).await, &step.expect) {
            (Ok(value), None) => value,
            (Ok(value), Some(code)) => bail!("succeeded with {value} but {code} was expected"),
            (Err(err), Some(code)) if err.code().to_string() == *code => {
                json!({ "error": code })
            }
            (Err(err), _) => return Err(err.into()),
        };

        if let Some(expected) = &step.contains {
            if !contains(expected, &result) {
                bail!("result {result} does not contain {expected}");
            }
        }
        if let Some(name) = &step.bind {
            self.bindings.insert(name.clone(), result.clone());
        }
        Ok(StepReport {
            step: index,
            op: step.op.clone(),
            result,
        })
    }

    fn session_for(&mut self, name: &str) -> SessionToken {
        if let Some(token) = self.sessions.get(name) {
            return token.clone();
        }
        let token = self
            .service
            .effects()
            .identity
            .login(ProfileId::new(name));
        self.sessions.insert(name.to_string(), token.clone());
        token
    }

    fn substitute(&self, value: Value) -> Result<Value> {
        Ok(match value {
            Value::String(raw) => match raw.strip_prefix('$') {
                Some(path) => self.lookup(path)?,
                None => Value::String(raw),
            },
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.substitute(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, item)| Ok((key, self.substitute(item)?)))
                    .collect::<Result<Map<String, Value>>>()?,
            ),
            other => other,
        })
    }

    fn lookup(&self, path: &str) -> Result<Value> {
        let mut segments = path.split('.');
        let name = segments.next().unwrap_or_default();
        let mut value = self
            .bindings
            .get(name)
            .with_context(|| format!("unbound variable ${name}"))?;
        for field in segments {
            value = value
                .get(field)
                .with_context(|| format!("${name} has no field {field}"))?;
        }
        Ok(value.clone())
    }

    async fn dispatch(&self, session: &SessionToken, op: &str, args: Value) -> BoostResult<Value> {
        let service = &self.service;
        match op {
            "createProfile" => {
                let a: ProfileArgs = parse(args)?;
                to_json(service.create_profile(session, &a.profile_id, a.display_name).await?)
            }
            "createBoost" => {
                let a: CreateBoost = parse(args)?;
                to_json(service.create_boost(session, a).await?)
            }
            "createChildBoost" => {
                let a: ChildArgs = parse(args)?;
                to_json(service.create_child_boost(session, &a.parent_uri, a.boost).await?)
            }
            "updateBoost" => {
                let a: UpdateArgs = parse(args)?;
                to_json(service.update_boost(session, &a.uri, a.updates).await?)
            }
            "getBoost" => {
                let a: UriArgs = parse(args)?;
                to_json(service.get_boost(session, &a.uri).await?)
            }
            "addBoostAdmin" => {
                let a: MemberArgs = parse(args)?;
                service.add_boost_admin(session, &a.uri, &a.profile_id).await?;
                Ok(Value::Bool(true))
            }
            "removeBoostAdmin" => {
                let a: MemberArgs = parse(args)?;
                service.remove_boost_admin(session, &a.uri, &a.profile_id).await?;
                Ok(Value::Bool(true))
            }
            "getBoostAdmins" => {
                let a: PageArgs = parse(args)?;
                to_json(service.get_boost_admins(session, &a.uri, a.page).await?)
            }
            "getBoostPermissions" => {
                let a: UriArgs = parse(args)?;
                to_json(service.get_boost_permissions(session, &a.uri).await?)
            }
            "getOtherBoostPermissions" => {
                let a: MemberArgs = parse(args)?;
                to_json(
                    service
                        .get_other_boost_permissions(session, &a.uri, &a.profile_id)
                        .await?,
                )
            }
            "updateBoostPermissions" => {
                let a: PermissionArgs = parse(args)?;
                to_json(service.update_boost_permissions(session, &a.uri, a.updates).await?)
            }
            "updateOtherBoostPermissions" => {
                let a: OtherPermissionArgs = parse(args)?;
                to_json(
                    service
                        .update_other_boost_permissions(session, &a.uri, &a.profile_id, a.updates)
                        .await?,
                )
            }
            "sendBoost" => {
                let a: SendArgs = parse(args)?;
                let credential = self.sign_for(session, &a).await?;
                to_json(service.send_boost(session, &a.uri, &a.recipient, credential).await?)
            }
            "issueBoost" => {
                let a: RecipientArgs = parse(args)?;
                to_json(service.issue_boost(session, &a.uri, &a.recipient).await?)
            }
            "acceptCredential" => {
                let a: CredentialArgs = parse(args)?;
                to_json(service.accept_credential(session, &a.credential).await?)
            }
            "revokeBoostRecipient" => {
                let a: RecipientArgs = parse(args)?;
                to_json(service.revoke_boost_recipient(session, &a.uri, &a.recipient).await?)
            }
            "getBoostRecipients" => {
                let a: RecipientsArgs = parse(args)?;
                to_json(service.get_boost_recipients(session, &a.uri, a.query).await?)
            }
            "getBoostRecipientCount" => {
                let a: UriArgs = parse(args)?;
                to_json(service.get_boost_recipient_count(session, &a.uri).await?)
            }
            "getBoostRecipientsWithChildren" => {
                let a: RecipientsArgs = parse(args)?;
                to_json(
                    service
                        .get_boost_recipients_with_children(session, &a.uri, a.generations, a.query)
                        .await?,
                )
            }
            "getBoostRecipientsWithChildrenCount" => {
                let a: GenerationArgs = parse(args)?;
                to_json(
                    service
                        .get_boost_recipients_with_children_count(session, &a.uri, a.generations)
                        .await?,
                )
            }
            "getRevokedCredentials" => to_json(service.get_revoked_credentials(session).await?),
            "getBoostAnalytics" => {
                let a: UriArgs = parse(args)?;
                to_json(service.get_boost_analytics(session, &a.uri).await?)
            }
            "createClaimHook" => {
                let a: NewClaimHook = parse(args)?;
                to_json(service.create_claim_hook(session, a).await?)
            }
            "getClaimHooksForBoost" => {
                let a: UriArgs = parse(args)?;
                to_json(service.get_claim_hooks_for_boost(session, &a.uri).await?)
            }
            "deleteClaimHook" => {
                let a: HookArgs = parse(args)?;
                to_json(service.delete_claim_hook(session, &a.id).await?)
            }
            "getBoostChildren" => {
                let a: GenerationArgs = parse(args)?;
                to_json(service.get_boost_children(session, &a.uri, a.generations).await?)
            }
            "countBoostChildren" => {
                let a: GenerationArgs = parse(args)?;
                to_json(service.count_boost_children(session, &a.uri, a.generations).await?)
            }
            "getBoostParents" => {
                let a: GenerationArgs = parse(args)?;
                to_json(service.get_boost_parents(session, &a.uri, a.generations).await?)
            }
            "countBoostParents" => {
                let a: GenerationArgs = parse(args)?;
                to_json(service.count_boost_parents(session, &a.uri, a.generations).await?)
            }
            "getBoostSiblings" => {
                let a: UriArgs = parse(args)?;
                to_json(service.get_boost_siblings(session, &a.uri).await?)
            }
            "countBoostSiblings" => {
                let a: UriArgs = parse(args)?;
                to_json(service.count_boost_siblings(session, &a.uri).await?)
            }
            "getFamilialBoosts" => {
                let a: FamilialArgs = parse(args)?;
                to_json(
                    service
                        .get_familial_boosts(
                            session,
                            &a.uri,
                            a.parent_generations,
                            a.child_generations,
                        )
                        .await?,
                )
            }
            "countFamilialBoosts" => {
                let a: FamilialArgs = parse(args)?;
                to_json(
                    service
                        .count_familial_boosts(
                            session,
                            &a.uri,
                            a.parent_generations,
                            a.child_generations,
                        )
                        .await?,
                )
            }
            "makeBoostParent" => {
                let a: ParentArgs = parse(args)?;
                to_json(
                    service
                        .make_boost_parent(session, &a.parent_uri, &a.child_uri)
                        .await?,
                )
            }
            "removeBoostParent" => {
                let a: ChildUriArgs = parse(args)?;
                to_json(service.remove_boost_parent(session, &a.child_uri).await?)
            }
            other => Err(BoostError::bad_request(format!("Unknown operation: {other}"))),
        }
    }

    async fn sign_for(
        &self,
        session: &SessionToken,
        args: &SendArgs,
    ) -> BoostResult<SignedCredential> {
        let domain = &self.service.config().domain;
        let id = match &args.credential_id {
            Some(id) => CredentialRef::new(domain, id),
            None => CredentialRef::generate(domain),
        };
        let issuer = self
            .service
            .effects()
            .identity
            .resolve_actor(session)
            .await
            .ok_or_else(|| BoostError::unauthorized("Missing or expired session"))?;
        self.service
            .effects()
            .credentials
            .sign(CredentialPayload {
                id,
                boost_uri: args.uri.clone(),
                issuer,
                subject: args.recipient.clone(),
                body: Value::Null,
            })
            .await
    }
}

/// Load a script from disk
pub fn load_script(path: &Path) -> Result<Script> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// `boost replay`
pub async fn run(script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = BoostServiceConfig::load(config_path)?;
    let script = load_script(script_path)?;
    let mut replayer = Replayer::new(config)?;
    for report in replayer.run(&script).await? {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

fn contains(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(wanted), Value::Object(present)) => wanted
            .iter()
            .all(|(key, want)| present.get(key).is_some_and(|have| contains(want, have))),
        _ => expected == actual,
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> BoostResult<T> {
    Ok(serde_json::from_value(args)?)
}

fn to_json<T: Serialize>(value: T) -> BoostResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| BoostError::internal(format!("Failed to encode result: {e}")))
}

// ============================================================================
// Operation arguments
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileArgs {
    profile_id: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UriArgs {
    uri: BoostUri,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildArgs {
    parent_uri: BoostUri,
    #[serde(flatten)]
    boost: CreateBoost,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    uri: BoostUri,
    #[serde(flatten)]
    updates: BoostUpdates,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberArgs {
    uri: BoostUri,
    profile_id: ProfileId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
    uri: BoostUri,
    #[serde(flatten)]
    page: PageRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionArgs {
    uri: BoostUri,
    updates: PermissionUpdate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OtherPermissionArgs {
    uri: BoostUri,
    profile_id: ProfileId,
    updates: PermissionUpdate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipientArgs {
    uri: BoostUri,
    recipient: ProfileId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendArgs {
    uri: BoostUri,
    recipient: ProfileId,
    credential_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialArgs {
    credential: CredentialRef,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipientsArgs {
    uri: BoostUri,
    #[serde(default)]
    generations: u32,
    #[serde(flatten)]
    query: RecipientQuery,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HookArgs {
    id: HookId,
}

fn one() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationArgs {
    uri: BoostUri,
    #[serde(default = "one")]
    generations: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilialArgs {
    uri: BoostUri,
    #[serde(default = "one")]
    parent_generations: u32,
    #[serde(default = "one")]
    child_generations: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentArgs {
    parent_uri: BoostUri,
    child_uri: BoostUri,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildUriArgs {
    child_uri: BoostUri,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_subsets() {
        let actual = json!({ "canIssue": true, "canRevoke": false, "nested": { "a": 1, "b": 2 } });
        assert!(contains(&json!({ "canIssue": true }), &actual));
        assert!(contains(&json!({ "nested": { "b": 2 } }), &actual));
        assert!(!contains(&json!({ "canRevoke": true }), &actual));
        assert!(!contains(&json!({ "missing": 1 }), &actual));
    }

    #[test]
    fn unknown_step_fields_are_rejected() {
        let raw = json!({ "steps": [{ "as": "admin", "op": "getBoost", "oops": 1 }] });
        assert!(serde_json::from_value::<Script>(raw).is_err());
    }
}
