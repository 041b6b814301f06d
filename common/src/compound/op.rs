use std::{fmt, hash::Hash};

/// Operation numbers of one compound direction.
pub trait Operation: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Prefix of the protocol names, `OP_` or `OP_CB_`.
    const PREFIX: &'static str;

    fn code(self) -> u32;

    fn from_code(code: u32) -> Option<Self>;

    fn name(self) -> &'static str;

    // `OP_CB_RECALL` -> `recall`
    fn short_name(self) -> String {
        let name = self.name();
        name.strip_prefix(Self::PREFIX)
            .unwrap_or(name)
            .to_ascii_lowercase()
    }
}

macro_rules! operation_enum {
    ($(#[$meta:meta])* $name:ident, prefix = $prefix:literal { $($variant:ident = $value:literal => $text:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::FromRepr, strum::EnumIter)]
        #[repr(u32)]
        pub enum $name {
            $(
                #[strum(serialize = $text)]
                $variant = $value,
            )*
        }

        impl Operation for $name {
            const PREFIX: &'static str = $prefix;

            fn code(self) -> u32 {
                self as u32
            }

            fn from_code(code: u32) -> Option<Self> {
                Self::from_repr(code)
            }

            fn name(self) -> &'static str {
                self.into()
            }
        }
    };
}

operation_enum!(
    /// `nfs_opnum4`
    OpNum, prefix = "OP_" {
        Access = 3 => "OP_ACCESS",
        Close = 4 => "OP_CLOSE",
        Commit = 5 => "OP_COMMIT",
        Create = 6 => "OP_CREATE",
        DelegPurge = 7 => "OP_DELEGPURGE",
        DelegReturn = 8 => "OP_DELEGRETURN",
        GetAttr = 9 => "OP_GETATTR",
        GetFh = 10 => "OP_GETFH",
        Link = 11 => "OP_LINK",
        Lock = 12 => "OP_LOCK",
        LockT = 13 => "OP_LOCKT",
        LockU = 14 => "OP_LOCKU",
        Lookup = 15 => "OP_LOOKUP",
        LookupP = 16 => "OP_LOOKUPP",
        NVerify = 17 => "OP_NVERIFY",
        Open = 18 => "OP_OPEN",
        OpenAttr = 19 => "OP_OPENATTR",
        OpenConfirm = 20 => "OP_OPEN_CONFIRM",
        OpenDowngrade = 21 => "OP_OPEN_DOWNGRADE",
        PutFh = 22 => "OP_PUTFH",
        PutPubFh = 23 => "OP_PUTPUBFH",
        PutRootFh = 24 => "OP_PUTROOTFH",
        Read = 25 => "OP_READ",
        ReadDir = 26 => "OP_READDIR",
        ReadLink = 27 => "OP_READLINK",
        Remove = 28 => "OP_REMOVE",
        Rename = 29 => "OP_RENAME",
        Renew = 30 => "OP_RENEW",
        RestoreFh = 31 => "OP_RESTOREFH",
        SaveFh = 32 => "OP_SAVEFH",
        SecInfo = 33 => "OP_SECINFO",
        SetAttr = 34 => "OP_SETATTR",
        SetClientId = 35 => "OP_SETCLIENTID",
        SetClientIdConfirm = 36 => "OP_SETCLIENTID_CONFIRM",
        Verify = 37 => "OP_VERIFY",
        Write = 38 => "OP_WRITE",
        ReleaseLockOwner = 39 => "OP_RELEASE_LOCKOWNER",
        BackchannelCtl = 40 => "OP_BACKCHANNEL_CTL",
        BindConnToSession = 41 => "OP_BIND_CONN_TO_SESSION",
        ExchangeId = 42 => "OP_EXCHANGE_ID",
        CreateSession = 43 => "OP_CREATE_SESSION",
        DestroySession = 44 => "OP_DESTROY_SESSION",
        FreeStateId = 45 => "OP_FREE_STATEID",
        GetDirDelegation = 46 => "OP_GET_DIR_DELEGATION",
        GetDeviceInfo = 47 => "OP_GETDEVICEINFO",
        GetDeviceList = 48 => "OP_GETDEVICELIST",
        LayoutCommit = 49 => "OP_LAYOUTCOMMIT",
        LayoutGet = 50 => "OP_LAYOUTGET",
        LayoutReturn = 51 => "OP_LAYOUTRETURN",
        SecInfoNoName = 52 => "OP_SECINFO_NO_NAME",
        Sequence = 53 => "OP_SEQUENCE",
        SetSsv = 54 => "OP_SET_SSV",
        TestStateId = 55 => "OP_TEST_STATEID",
        WantDelegation = 56 => "OP_WANT_DELEGATION",
        DestroyClientId = 57 => "OP_DESTROY_CLIENTID",
        ReclaimComplete = 58 => "OP_RECLAIM_COMPLETE",
        Illegal = 10044 => "OP_ILLEGAL",
    }
);

operation_enum!(
    /// `nfs_cb_opnum4`
    CbOpNum, prefix = "OP_CB_" {
        GetAttr = 3 => "OP_CB_GETATTR",
        Recall = 4 => "OP_CB_RECALL",
        LayoutRecall = 5 => "OP_CB_LAYOUTRECALL",
        Notify = 6 => "OP_CB_NOTIFY",
        PushDeleg = 7 => "OP_CB_PUSH_DELEG",
        RecallAny = 8 => "OP_CB_RECALL_ANY",
        RecallableObjAvail = 9 => "OP_CB_RECALLABLE_OBJ_AVAIL",
        RecallSlot = 10 => "OP_CB_RECALL_SLOT",
        Sequence = 11 => "OP_CB_SEQUENCE",
        WantsCancelled = 12 => "OP_CB_WANTS_CANCELLED",
        NotifyLock = 13 => "OP_CB_NOTIFY_LOCK",
        NotifyDeviceId = 14 => "OP_CB_NOTIFY_DEVICEID",
        Illegal = 10044 => "OP_CB_ILLEGAL",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(OpNum::Sequence.to_string(), "OP_SEQUENCE");
        assert_eq!(OpNum::SecInfoNoName.short_name(), "secinfo_no_name");
        assert_eq!(CbOpNum::RecallAny.short_name(), "recall_any");
    }

    #[test]
    fn test_codes() {
        assert_eq!(OpNum::from_code(53), Some(OpNum::Sequence));
        assert_eq!(CbOpNum::from_code(11), Some(CbOpNum::Sequence));
        assert_eq!(OpNum::from_code(2), None);
        assert_eq!(OpNum::Illegal.code(), 10044);
    }
}
