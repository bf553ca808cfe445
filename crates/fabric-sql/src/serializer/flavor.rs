use super::Serializer;

use fabric_core::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flavor {
    Fabric,
    Ansi,
}

impl Serializer {
    pub fn fabric() -> Serializer {
        Serializer {
            flavor: Flavor::Fabric,
        }
    }

    pub fn ansi() -> Serializer {
        Serializer {
            flavor: Flavor::Ansi,
        }
    }

    pub fn for_dialect(dialect: Dialect) -> Serializer {
        match dialect {
            Dialect::Fabric => Serializer::fabric(),
            Dialect::Ansi => Serializer::ansi(),
        }
    }

    pub fn is_fabric(&self) -> bool {
        self.flavor == Flavor::Fabric
    }
}
