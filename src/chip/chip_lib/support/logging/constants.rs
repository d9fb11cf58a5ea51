use core::fmt;
use core::str::FromStr;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub enum LogCategory {
    KLogCategoryNone = 0,
    KLogCategoryError = 1,
    KLogCategoryProgress = 2,
    KLogCategoryDetail = 3,
    KLogCategoryMax = 4,
}

impl FromStr for LogCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KLogCategoryNone" => Ok(LogCategory::KLogCategoryNone),
            "KLogCategoryError" => Ok(LogCategory::KLogCategoryError),
            "KLogCategoryProgress" => Ok(LogCategory::KLogCategoryProgress),
            "KLogCategoryDetail" => Ok(LogCategory::KLogCategoryDetail),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogCategory::KLogCategoryError => "E",
            LogCategory::KLogCategoryProgress => "P",
            LogCategory::KLogCategoryDetail => "D",
            _ => "-",
        };
        write!(f, "{}", name)
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub enum LogModule {
    KLogModuleNotSpecified = 0,
    KLogModuleTLV,
    KLogModuleASN1,
    KLogModuleCrypto,
    KLogModuleSecureChannel,
    KLogModuleSupport,
    KLogModuleTest,
    KLogModuleMax,
}

impl FromStr for LogModule {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KLogModuleNotSpecified" => Ok(LogModule::KLogModuleNotSpecified),
            "KLogModuleTLV" => Ok(LogModule::KLogModuleTLV),
            "KLogModuleASN1" => Ok(LogModule::KLogModuleASN1),
            "KLogModuleCrypto" => Ok(LogModule::KLogModuleCrypto),
            "KLogModuleSecureChannel" => Ok(LogModule::KLogModuleSecureChannel),
            "KLogModuleSupport" => Ok(LogModule::KLogModuleSupport),
            "KLogModuleTest" => Ok(LogModule::KLogModuleTest),
            _ => Err(()),
        }
    }
}
