//! Router module — the single entry point the UI layer calls.
//!
//! `RequestRouter::dispatch(operation, params)` resolves the operation,
//! decodes its parameters, and either runs its tool (through the executor
//! and translator) or calls the vault. It never returns an error: every
//! failure comes back as an `OperationResult::Failure`.

pub mod auth;
pub mod operation;
pub mod params;
pub mod table;

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::errors::{Result, ToolVaultError};
use crate::executor::{CommandExecutor, ProcessInvocation};
use crate::translate::{translate, OperationResult};
use crate::vault::CredentialVault;

pub use operation::Operation;
pub use table::{OperationTable, SecretBinding, ToolSpec};

use params::{
    decode, flag_value, invalid, positional, CliParams, CustomerParams, DiscoverParams,
    PostParams, SaveSecretParams, SearchParams, SecretNameParams,
};

pub struct RequestRouter {
    table: OperationTable,
    executor: CommandExecutor,
    vault: Arc<CredentialVault>,
}

impl RequestRouter {
    /// Build the operation table from `settings` and take shared
    /// ownership of `vault`.
    pub fn new(settings: &Settings, vault: Arc<CredentialVault>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            table: OperationTable::build(settings)?,
            executor: CommandExecutor::new().with_default_timeout(settings.default_timeout()),
            vault,
        })
    }

    /// Run `operation` (any accepted spelling) with a JSON parameter object.
    pub async fn dispatch(&self, operation: &str, params: Value) -> OperationResult {
        match operation.parse::<Operation>() {
            Ok(op) => self.dispatch_op(op, params).await,
            Err(e) => {
                warn!(operation = operation, "unknown operation");
                e.into()
            }
        }
    }

    pub async fn dispatch_op(&self, op: Operation, params: Value) -> OperationResult {
        let started = Instant::now();
        let result = match self.run(op, params).await {
            Ok(result) => result,
            Err(e) => e.into(),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result.as_failure() {
            None => info!(operation = %op, elapsed_ms, "operation succeeded"),
            Some(f) if f.kind.is_data_affecting() => {
                error!(operation = %op, kind = %f.kind, message = %f.message, elapsed_ms, "operation failed");
            }
            Some(f) => {
                warn!(operation = %op, kind = %f.kind, message = %f.message, elapsed_ms, "operation failed");
            }
        }
        result
    }

    async fn run(&self, op: Operation, params: Value) -> Result<OperationResult> {
        match op {
            Operation::SearchKnowledgeBase => {
                let p: SearchParams = decode(op, params)?;
                let mut args = vec![
                    "search".to_string(),
                    positional(op, "query", &p.query)?,
                    "--format".to_string(),
                    "json".to_string(),
                ];
                if let Some(product) = &p.product {
                    args.push("--product".into());
                    args.push(flag_value(op, "product", product)?);
                }
                if let Some(limit) = p.limit {
                    if limit == 0 {
                        return Err(invalid(op, "'limit' must be at least 1"));
                    }
                    args.push("--limit".into());
                    args.push(limit.to_string());
                }
                self.run_tool(op, args).await
            }
            Operation::CheckReport | Operation::UpdateReport => {
                let p: CustomerParams = decode(op, params)?;
                let verb = if op == Operation::CheckReport {
                    "check"
                } else {
                    "update"
                };
                let args = vec![verb.to_string(), positional(op, "customer", &p.customer)?];
                self.run_tool(op, args).await
            }
            Operation::PostReport => {
                let p: PostParams = decode(op, params)?;
                let mut args = vec!["post".to_string(), positional(op, "customer", &p.customer)?];
                if let Some(format) = &p.format {
                    args.push("--format".into());
                    args.push(flag_value(op, "format", format)?);
                }
                self.run_tool(op, args).await
            }
            Operation::OnboardDiscover => {
                let p: DiscoverParams = decode(op, params)?;
                let args = vec![
                    "onboard".to_string(),
                    "--discover".to_string(),
                    positional(op, "name", &p.name)?,
                ];
                let mut result = self.run_tool(op, args).await?;
                if let OperationResult::Success {
                    payload: Value::Object(fields),
                } = &mut result
                {
                    fields.insert("name".into(), Value::String(p.name));
                }
                Ok(result)
            }
            Operation::OnboardGenerate => {
                let args = vec!["onboard".to_string(), "--generate".to_string()];
                self.run_tool(op, args).await
            }
            Operation::RunCli => {
                let p: CliParams = decode(op, params)?;
                let mut args = vec![positional(op, "command", &p.command)?];
                args.extend(p.args);
                self.run_tool(op, args).await
            }
            Operation::CheckAuth => self.check_auth().await,
            Operation::SaveSecret => {
                let p: SaveSecretParams = decode(op, params)?;
                if p.value.is_empty() {
                    return Err(invalid(op, "'value' cannot be empty"));
                }
                let secret = self
                    .with_vault(move |vault| vault.set_secret(&p.name, p.value.as_bytes()))
                    .await?;
                Ok(OperationResult::success(json!({
                    "name": secret.name,
                    "savedAt": secret.saved_at,
                })))
            }
            Operation::LoadSecret => {
                let p: SecretNameParams = decode(op, params)?;
                let name = p.name.clone();
                let secret = self
                    .with_vault(move |vault| vault.get_secret(&p.name))
                    .await?
                    .ok_or(ToolVaultError::SecretNotFound(name))?;
                Ok(OperationResult::success(json!({
                    "name": secret.name,
                    "value": secret.value_lossy(),
                    "savedAt": secret.saved_at,
                })))
            }
            Operation::DeleteSecret => {
                let p: SecretNameParams = decode(op, params)?;
                let name = p.name.clone();
                let deleted = self
                    .with_vault(move |vault| vault.delete_secret(&p.name))
                    .await?;
                Ok(OperationResult::success(json!({
                    "name": name,
                    "deleted": deleted,
                })))
            }
            Operation::SecretStatus => {
                let status = self.with_vault(|vault| vault.status()).await?;
                let payload = serde_json::to_value(status)
                    .map_err(|e| ToolVaultError::SerializationError(e.to_string()))?;
                Ok(OperationResult::success(payload))
            }
            Operation::ResetVault => {
                self.with_vault(|vault| vault.reset()).await?;
                Ok(OperationResult::success(json!({ "reset": true })))
            }
        }
    }

    async fn run_tool(&self, op: Operation, args: Vec<String>) -> Result<OperationResult> {
        let spec = self
            .table
            .spec(op)
            .ok_or_else(|| ToolVaultError::UnknownOperation(op.name().to_string()))?;

        let mut env = spec.env.clone();
        if !spec.secrets.is_empty() {
            let bindings = spec.secrets.clone();
            let injected = self
                .with_vault(move |vault| {
                    let stored = vault.load()?;
                    Ok(bindings
                        .iter()
                        .filter_map(|b| {
                            stored
                                .get(b.secret)
                                .map(|s| (b.env_var.to_string(), s.value_lossy()))
                        })
                        .collect::<Vec<_>>())
                })
                .await?;
            debug!(
                operation = %op,
                vars = ?injected.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                "secrets injected"
            );
            env.extend(injected);
        }

        let mut invocation = ProcessInvocation::new(spec.tool.clone())
            .args(spec.args_prefix.iter().cloned())
            .args(args)
            .envs(env);
        if let Some(timeout) = spec.timeout {
            invocation = invocation.timeout(timeout);
        }
        if let Some(dir) = &spec.working_dir {
            invocation = invocation.working_dir(dir.clone());
        }

        let outcome = self.executor.run(invocation).await;
        Ok(translate(&outcome, &spec.shape))
    }

    async fn check_auth(&self) -> Result<OperationResult> {
        let (vpn, kerberos, tokens) = tokio::join!(
            auth::vpn_active(&self.executor),
            auth::kerberos_ticket(&self.executor),
            self.with_vault(|vault| {
                let stored = vault.load()?;
                Ok((stored.contains_key("jira"), stored.contains_key("portal")))
            }),
        );
        let (jira, portal) = tokens?;
        Ok(OperationResult::success(json!({
            "vpn": vpn,
            "kerberos": kerberos,
            "jiraToken": jira,
            "portalToken": portal,
        })))
    }

    /// Run a vault call on the blocking pool.
    async fn with_vault<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CredentialVault) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let vault = Arc::clone(&self.vault);
        tokio::task::spawn_blocking(move || f(&vault))
            .await
            .map_err(|e| ToolVaultError::TaskFailed(e.to_string()))?
    }
}
