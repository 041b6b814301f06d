//! Shared state and assertion helpers of the NFSv3 conformance tests.

use std::{net::IpAddr, sync::Arc};

use log::debug;

use nfstest_common::{
    rpc::{Credential, PortResolver, SecurityContext},
    status::{NfsStat3, ProtocolStatus},
    time::get_current_time_in_seconds,
    verifier::{self, init_verifier_clock, Verifier},
};

use crate::{
    config::{ClientConfig, SecurityFlavor},
    error::{CheckError, CheckResult},
    nfs3::{resolve_host, Nfs3Client},
    portmap::PortmapClient,
    url::{make_path, path_components, NfsUrl},
};

/// Name of the scratch directory the tests create their files in.
pub const HOME_DIR: &str = "tmp";

/// Assert that `status` is one of `expected`.
///
/// On mismatch the error reads `"<msg> should return <A or B>, instead got
/// <C>"`. Statuses listed in `warnlist` produce a warning instead of a
/// failure.
pub fn check<S: ProtocolStatus>(status: S, expected: &[S], msg: &str, warnlist: &[S]) -> CheckResult<()> {
    if log::log_enabled!(log::Level::Debug) {
        debug!("checking {} against {}", status, join_names(expected));
    }
    if expected.contains(&status) {
        return Ok(());
    }

    let desired = match expected {
        [] => "one of <none>".to_owned(),
        _ => join_names(expected),
    };
    Err(CheckError::StatusMismatch {
        message: format!("{} should return {}, instead got {}", msg, desired, status),
        warning: warnlist.contains(&status),
    })
}

// Shortcut for the common "must succeed" assertion
pub fn check_ok<S: ProtocolStatus>(status: S, msg: &str) -> CheckResult<()> {
    check(status, &[S::OK], msg, &[])
}

fn join_names<S: ProtocolStatus>(statuses: &[S]) -> String {
    statuses
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Assert that the NFSv3 procedure `procedure` returned NFS3_OK, the error
/// keeps the procedure name and the status for diagnostics.
pub fn check_res(procedure: &str, status: NfsStat3, context: Option<&str>) -> CheckResult<()> {
    if status.is_ok() {
        return Ok(());
    }
    Err(CheckError::BadResult {
        procedure: procedure.to_owned(),
        status,
        context: context.map(str::to_owned),
    })
}

pub fn check_valid(cond: bool, msg: &str) -> CheckResult<()> {
    if cond {
        Ok(())
    } else {
        Err(CheckError::Failure(msg.to_owned()))
    }
}

/// Credentials, paths and naming shared by one test run.
pub struct Environment {
    config: ClientConfig,
    host: String,
    port: u16,
    export: String,
    home: String,
    timestamp: u64,
    pub cred1: Credential,
    pub cred2: Credential,
    pub rootcred: Credential,
    pub uid2: u32,
    pub gid2: u32,
}

impl Environment {
    pub fn new(config: ClientConfig) -> CheckResult<Self> {
        let cred1 = match config.flavor {
            SecurityFlavor::None => Credential::None,
            SecurityFlavor::Sys => Credential::sys(
                config.machine_name.as_str(),
                config.uid,
                config.gid,
                Vec::new(),
            )?,
        };
        Self::with_primary_credential(config, cred1)
    }

    // Strong authentication, the context was established by the caller
    pub fn with_security_context(config: ClientConfig, context: Arc<dyn SecurityContext>) -> CheckResult<Self> {
        Self::with_primary_credential(config, Credential::gss(context))
    }

    fn with_primary_credential(config: ClientConfig, cred1: Credential) -> CheckResult<Self> {
        let url = NfsUrl::parse(&config.server)?;
        let server = url
            .primary()
            .ok_or_else(|| CheckError::InvalidUrl(config.server.clone()))?;
        let export = if url.path.is_empty() {
            config.export.clone()
        } else {
            url.path.clone()
        };

        let mut components = path_components(&export, true);
        components.push(HOME_DIR.to_owned());
        let home = make_path(&components);

        let (uid2, gid2) = config.second_identity();
        let cred2 = Credential::sys("second", uid2, gid2, Vec::new())?;
        let rootcred = Credential::sys("root", 0, 0, Vec::new())?;

        // verifiers minted from now on are above anything used by an
        // earlier run against the same server
        let timestamp = get_current_time_in_seconds();
        init_verifier_clock(timestamp + 1);

        Ok(Self {
            host: server.host.clone(),
            port: config.port.unwrap_or(server.port),
            export,
            home,
            timestamp,
            cred1,
            cred2,
            rootcred,
            uid2,
            gid2,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn export(&self) -> &str {
        &self.export
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn new_verifier(&self) -> Verifier {
        verifier::new_verifier()
    }

    /// Unique name for objects created by the test `code` in this run.
    pub fn test_name(&self, code: &str) -> String {
        format!("{}_{}", code, self.timestamp)
    }

    /// NFSv3 client talking to the configured server with `cred1`.
    pub async fn connect(&self) -> CheckResult<Nfs3Client> {
        let ip = resolve_host(&self.host).await?;
        let resolver: Arc<dyn PortResolver> =
            Arc::new(PortmapClient::new(ip).with_timeout(self.config.call_timeout()));
        self.connect_with(ip, resolver).await
    }

    // Same as `connect` with the port mapper swapped out
    pub async fn connect_with(&self, ip: IpAddr, resolver: Arc<dyn PortResolver>) -> CheckResult<Nfs3Client> {
        let client = Nfs3Client::connect(
            ip,
            Some(self.port),
            resolver,
            self.cred1.clone(),
            self.config.call_timeout(),
        )
        .await?;
        Ok(client)
    }
}
