use std::{fmt, sync::Arc};

use bytes::Bytes;

use super::{
    error::{RpcError, RpcResult},
    message::{AuthFlavor, CallHeader, OpaqueAuth},
};
use crate::{
    config::{MAX_AUTH_BYTES, MAX_AUTH_SYS_GIDS, MAX_MACHINE_NAME},
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::get_current_time_in_seconds,
};

/// An established strong authentication context (RPCSEC_GSS).
///
/// Establishing the context is done by the caller; the RPC layer only asks it
/// for the credential and verifier of each call.
pub trait SecurityContext: Send + Sync {
    /// Credential body for the next call. Contexts with a sequence window
    /// advance it here.
    fn credential(&self) -> RpcResult<OpaqueAuth>;

    /// Verifier computed over the encoded call header (xid up to and
    /// including the credential).
    fn verifier(&self, header: &[u8]) -> RpcResult<OpaqueAuth>;

    /// Check the verifier returned by the server.
    fn verify_reply(&self, _verifier: &OpaqueAuth) -> RpcResult<()> {
        Ok(())
    }

    fn principal(&self) -> String;
}

/// `authsys_parms`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSys {
    pub stamp: u32,
    pub machine_name: String,
    pub uid: u32,
    pub gid: u32,
    pub gids: Vec<u32>,
}

impl AuthSys {
    pub fn new(machine_name: impl Into<String>, uid: u32, gid: u32, gids: Vec<u32>) -> RpcResult<Self> {
        let machine_name = machine_name.into();
        if machine_name.len() > MAX_MACHINE_NAME {
            return Err(RpcError::InvalidCredential("machine name too long"));
        }
        if gids.len() > MAX_AUTH_SYS_GIDS {
            return Err(RpcError::InvalidCredential("too many supplementary groups"));
        }

        Ok(Self {
            stamp: get_current_time_in_seconds() as u32,
            machine_name,
            uid,
            gid,
            gids,
        })
    }
}

impl Serializer for AuthSys {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.stamp);
        writer.write_string(&self.machine_name);
        writer.write_u32(self.uid);
        writer.write_u32(self.gid);
        self.gids.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let stamp = reader.read_u32()?;
        let machine_name = reader.read_string(Some(MAX_MACHINE_NAME))?;
        let uid = reader.read_u32()?;
        let gid = reader.read_u32()?;
        let gids = Vec::<u32>::read(reader)?;
        if gids.len() > MAX_AUTH_SYS_GIDS {
            return Err(ReaderError::TooLong(gids.len(), MAX_AUTH_SYS_GIDS));
        }

        Ok(Self {
            stamp,
            machine_name,
            uid,
            gid,
            gids,
        })
    }
}

/// Identity and authentication mechanics of one call.
#[derive(Clone, Default)]
pub enum Credential {
    #[default]
    None,
    Sys(AuthSys),
    Gss(Arc<dyn SecurityContext>),
}

impl Credential {
    pub fn sys(machine_name: impl Into<String>, uid: u32, gid: u32, gids: Vec<u32>) -> RpcResult<Self> {
        AuthSys::new(machine_name, uid, gid, gids).map(Self::Sys)
    }

    pub fn gss(context: Arc<dyn SecurityContext>) -> Self {
        Self::Gss(context)
    }

    pub fn flavor(&self) -> AuthFlavor {
        match self {
            Self::None => AuthFlavor::None,
            Self::Sys(_) => AuthFlavor::Sys,
            Self::Gss(_) => AuthFlavor::Gss,
        }
    }

    // Name of the principal this credential speaks for
    pub fn principal(&self) -> String {
        match self {
            Self::None => "nobody".to_owned(),
            Self::Sys(sys) => format!("{}@{}", sys.uid, sys.machine_name),
            Self::Gss(context) => context.principal(),
        }
    }

    /// Bind this credential to a call: fills in the header credential and
    /// returns the verifier to write right after the header.
    pub fn apply_to(&self, header: &mut CallHeader) -> RpcResult<OpaqueAuth> {
        match self {
            Self::None => {
                header.credential = OpaqueAuth::none();
                Ok(OpaqueAuth::none())
            }
            Self::Sys(sys) => {
                let body = sys.to_bytes();
                if body.len() > MAX_AUTH_BYTES {
                    return Err(RpcError::InvalidCredential("AUTH_SYS body exceeds 400 bytes"));
                }
                header.credential = OpaqueAuth::new(AuthFlavor::Sys, Bytes::from(body));
                Ok(OpaqueAuth::none())
            }
            Self::Gss(context) => {
                header.credential = context.credential()?;
                context.verifier(&header.to_bytes())
            }
        }
    }

    pub fn verify_reply(&self, verifier: &OpaqueAuth) -> RpcResult<()> {
        match self {
            Self::Gss(context) => context.verify_reply(verifier),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "Credential::None"),
            Self::Sys(sys) => write!(f, "Credential::Sys({:?})", sys),
            Self::Gss(context) => write!(f, "Credential::Gss({})", context.principal()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CountingContext {
        seq: AtomicU32,
    }

    impl SecurityContext for CountingContext {
        fn credential(&self) -> RpcResult<OpaqueAuth> {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            Ok(OpaqueAuth::new(
                AuthFlavor::Gss,
                Bytes::from(seq.to_be_bytes().to_vec()),
            ))
        }

        fn verifier(&self, header: &[u8]) -> RpcResult<OpaqueAuth> {
            // stand-in for a MIC: the header length
            Ok(OpaqueAuth::new(
                AuthFlavor::Gss,
                Bytes::from((header.len() as u32).to_be_bytes().to_vec()),
            ))
        }

        fn principal(&self) -> String {
            "nfs/host@REALM".to_owned()
        }
    }

    fn header() -> CallHeader {
        CallHeader {
            xid: 42,
            program: 100003,
            version: 4,
            procedure: 1,
            credential: OpaqueAuth::none(),
        }
    }

    #[test]
    fn test_sys_limits() {
        assert!(Credential::sys("h".repeat(256), 0, 0, vec![]).is_err());
        assert!(Credential::sys("host", 0, 0, vec![1; 17]).is_err());
        assert!(Credential::sys("host", 0, 0, vec![1; 16]).is_ok());
    }

    #[test]
    fn test_sys_apply_to() {
        let credential = Credential::sys("client", 1000, 100, vec![4, 5]).unwrap();
        let mut header = header();
        let verifier = credential.apply_to(&mut header).unwrap();
        assert_eq!(verifier, OpaqueAuth::none());
        assert_eq!(header.credential.flavor, AuthFlavor::Sys as u32);

        let sys = AuthSys::from_bytes(&header.credential.body).unwrap();
        assert_eq!(sys.uid, 1000);
        assert_eq!(sys.gids, vec![4, 5]);
        assert_eq!(credential.principal(), "1000@client");
    }

    #[test]
    fn test_gss_verifier_covers_header() {
        let credential = Credential::gss(Arc::new(CountingContext {
            seq: AtomicU32::new(7),
        }));
        let mut header = header();
        let verifier = credential.apply_to(&mut header).unwrap();
        assert_eq!(&header.credential.body[..], &7u32.to_be_bytes());
        let expected = header.to_bytes().len() as u32;
        assert_eq!(&verifier.body[..], &expected.to_be_bytes());

        // the context advances per call
        credential.apply_to(&mut header).unwrap();
        assert_eq!(&header.credential.body[..], &8u32.to_be_bytes());
        assert_eq!(credential.flavor(), AuthFlavor::Gss);
    }
}
