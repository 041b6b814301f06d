//! Protocol status vocabulary.
//!
//! NFSv4.x (`nfsstat4`), NFSv3 (`nfsstat3`) and MOUNTv3 (`mountstat3`)
//! status codes. The printable names are the ones used by the protocol
//! definitions so that assertion failures read like the RFCs.

use std::fmt::Display;

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

/// Common behaviour of every status enum, used by generic assertion helpers.
pub trait ProtocolStatus: Copy + PartialEq + Display + Send + Sync + 'static {
    /// The success code of this protocol.
    const OK: Self;

    fn code(self) -> u32;

    fn is_ok(self) -> bool {
        self == Self::OK
    }
}

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident, ok = $ok:ident { $($variant:ident = $value:literal => $text:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::FromRepr)]
        #[repr(u32)]
        pub enum $name {
            $(
                #[strum(serialize = $text)]
                $variant = $value,
            )*
        }

        impl $name {
            pub fn from_code(code: u32) -> Result<Self, ReaderError> {
                Self::from_repr(code).ok_or(ReaderError::UnknownDiscriminant(code))
            }

            pub fn name(self) -> &'static str {
                self.into()
            }
        }

        impl ProtocolStatus for $name {
            const OK: Self = Self::$ok;

            fn code(self) -> u32 {
                self as u32
            }
        }

        impl Serializer for $name {
            fn write(&self, writer: &mut Writer) {
                writer.write_u32(*self as u32);
            }

            fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
                Self::from_code(reader.read_u32()?)
            }

            fn size(&self) -> usize {
                4
            }
        }
    };
}

status_enum!(
    /// `nfsstat4`
    NfsStat4, ok = Ok {
        Ok = 0 => "NFS4_OK",
        Perm = 1 => "NFS4ERR_PERM",
        NoEnt = 2 => "NFS4ERR_NOENT",
        Io = 5 => "NFS4ERR_IO",
        Nxio = 6 => "NFS4ERR_NXIO",
        Access = 13 => "NFS4ERR_ACCESS",
        Exist = 17 => "NFS4ERR_EXIST",
        Xdev = 18 => "NFS4ERR_XDEV",
        NotDir = 20 => "NFS4ERR_NOTDIR",
        IsDir = 21 => "NFS4ERR_ISDIR",
        Inval = 22 => "NFS4ERR_INVAL",
        FBig = 27 => "NFS4ERR_FBIG",
        NoSpc = 28 => "NFS4ERR_NOSPC",
        Rofs = 30 => "NFS4ERR_ROFS",
        MLink = 31 => "NFS4ERR_MLINK",
        NameTooLong = 63 => "NFS4ERR_NAMETOOLONG",
        NotEmpty = 66 => "NFS4ERR_NOTEMPTY",
        DQuot = 69 => "NFS4ERR_DQUOT",
        Stale = 70 => "NFS4ERR_STALE",
        BadHandle = 10001 => "NFS4ERR_BADHANDLE",
        BadCookie = 10003 => "NFS4ERR_BAD_COOKIE",
        NotSupp = 10004 => "NFS4ERR_NOTSUPP",
        TooSmall = 10005 => "NFS4ERR_TOOSMALL",
        ServerFault = 10006 => "NFS4ERR_SERVERFAULT",
        BadType = 10007 => "NFS4ERR_BADTYPE",
        Delay = 10008 => "NFS4ERR_DELAY",
        Same = 10009 => "NFS4ERR_SAME",
        Denied = 10010 => "NFS4ERR_DENIED",
        Expired = 10011 => "NFS4ERR_EXPIRED",
        Locked = 10012 => "NFS4ERR_LOCKED",
        Grace = 10013 => "NFS4ERR_GRACE",
        FhExpired = 10014 => "NFS4ERR_FHEXPIRED",
        ShareDenied = 10015 => "NFS4ERR_SHARE_DENIED",
        WrongSec = 10016 => "NFS4ERR_WRONGSEC",
        ClidInUse = 10017 => "NFS4ERR_CLID_INUSE",
        Resource = 10018 => "NFS4ERR_RESOURCE",
        Moved = 10019 => "NFS4ERR_MOVED",
        NoFileHandle = 10020 => "NFS4ERR_NOFILEHANDLE",
        MinorVersMismatch = 10021 => "NFS4ERR_MINOR_VERS_MISMATCH",
        StaleClientId = 10022 => "NFS4ERR_STALE_CLIENTID",
        StaleStateId = 10023 => "NFS4ERR_STALE_STATEID",
        OldStateId = 10024 => "NFS4ERR_OLD_STATEID",
        BadStateId = 10025 => "NFS4ERR_BAD_STATEID",
        BadSeqId = 10026 => "NFS4ERR_BAD_SEQID",
        NotSame = 10027 => "NFS4ERR_NOT_SAME",
        LockRange = 10028 => "NFS4ERR_LOCK_RANGE",
        Symlink = 10029 => "NFS4ERR_SYMLINK",
        RestoreFh = 10030 => "NFS4ERR_RESTOREFH",
        OpIllegal = 10044 => "NFS4ERR_OP_ILLEGAL",
        BadXdr = 10036 => "NFS4ERR_BADXDR",
        BadSession = 10052 => "NFS4ERR_BADSESSION",
        BadSlot = 10053 => "NFS4ERR_BADSLOT",
        CompleteAlready = 10054 => "NFS4ERR_COMPLETE_ALREADY",
        ConnNotBoundToSession = 10055 => "NFS4ERR_CONN_NOT_BOUND_TO_SESSION",
        SeqMisordered = 10063 => "NFS4ERR_SEQ_MISORDERED",
        SequencePos = 10064 => "NFS4ERR_SEQUENCE_POS",
        ReqTooBig = 10065 => "NFS4ERR_REQ_TOO_BIG",
        RepTooBig = 10066 => "NFS4ERR_REP_TOO_BIG",
        RepTooBigToCache = 10067 => "NFS4ERR_REP_TOO_BIG_TO_CACHE",
        RetryUncachedRep = 10068 => "NFS4ERR_RETRY_UNCACHED_REP",
        UnsafeCompound = 10069 => "NFS4ERR_UNSAFE_COMPOUND",
        TooManyOps = 10070 => "NFS4ERR_TOO_MANY_OPS",
        OpNotInSession = 10071 => "NFS4ERR_OP_NOT_IN_SESSION",
    }
);

status_enum!(
    /// `nfsstat3`
    NfsStat3, ok = Ok {
        Ok = 0 => "NFS3_OK",
        Perm = 1 => "NFS3ERR_PERM",
        NoEnt = 2 => "NFS3ERR_NOENT",
        Io = 5 => "NFS3ERR_IO",
        Nxio = 6 => "NFS3ERR_NXIO",
        Access = 13 => "NFS3ERR_ACCES",
        Exist = 17 => "NFS3ERR_EXIST",
        Xdev = 18 => "NFS3ERR_XDEV",
        NoDev = 19 => "NFS3ERR_NODEV",
        NotDir = 20 => "NFS3ERR_NOTDIR",
        IsDir = 21 => "NFS3ERR_ISDIR",
        Inval = 22 => "NFS3ERR_INVAL",
        FBig = 27 => "NFS3ERR_FBIG",
        NoSpc = 28 => "NFS3ERR_NOSPC",
        Rofs = 30 => "NFS3ERR_ROFS",
        MLink = 31 => "NFS3ERR_MLINK",
        NameTooLong = 63 => "NFS3ERR_NAMETOOLONG",
        NotEmpty = 66 => "NFS3ERR_NOTEMPTY",
        DQuot = 69 => "NFS3ERR_DQUOT",
        Stale = 70 => "NFS3ERR_STALE",
        Remote = 71 => "NFS3ERR_REMOTE",
        BadHandle = 10001 => "NFS3ERR_BADHANDLE",
        NotSync = 10002 => "NFS3ERR_NOT_SYNC",
        BadCookie = 10003 => "NFS3ERR_BAD_COOKIE",
        NotSupp = 10004 => "NFS3ERR_NOTSUPP",
        TooSmall = 10005 => "NFS3ERR_TOOSMALL",
        ServerFault = 10006 => "NFS3ERR_SERVERFAULT",
        BadType = 10007 => "NFS3ERR_BADTYPE",
        Jukebox = 10008 => "NFS3ERR_JUKEBOX",
    }
);

status_enum!(
    /// `mountstat3`
    MountStat3, ok = Ok {
        Ok = 0 => "MNT3_OK",
        Perm = 1 => "MNT3ERR_PERM",
        NoEnt = 2 => "MNT3ERR_NOENT",
        Io = 5 => "MNT3ERR_IO",
        Access = 13 => "MNT3ERR_ACCES",
        NotDir = 20 => "MNT3ERR_NOTDIR",
        Inval = 22 => "MNT3ERR_INVAL",
        NameTooLong = 63 => "MNT3ERR_NAMETOOLONG",
        NotSupp = 10004 => "MNT3ERR_NOTSUPP",
        ServerFault = 10006 => "MNT3ERR_SERVERFAULT",
    }
);
