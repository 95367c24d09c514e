//! Test fixtures and end-to-end scenarios over synthesized packages.

pub mod builder;


use crate::{
    loader::{MemorySource, PackageLoader},
    LoaderConfig,
};
use builder::PackageBuilder;

/// Name of the package built by [`dodo_package`].
pub const DODO: &str = "/Game/PrimalEarth/Dinos/Dodo/Dodo_Character_BP";

/// Class path of the dodo's class import.
pub const DINO_CLASS: &str = "/Script/ShooterGame.PrimalDinoCharacter";

/// A package with a single export carrying a handful of properties.
pub fn dodo_package() -> Vec<u8> {
    let mut builder = PackageBuilder::new();
    let class = builder.import_class("/Script/ShooterGame", "PrimalDinoCharacter");
    let body = builder.properties(|p| {
        p.str("DescriptiveName", 0, "Dodo")
            .float("MaxStatusValues", 0, 40.0)
            .float("MaxStatusValues", 3, 150.0)
            .bool("bCanFly", 0, false)
            .none();
    });
    builder.export(class, 0, "Dodo_Character_BP_C", body);
    builder.build()
}

/// A loader serving `packages` from memory.
pub fn memory_loader(packages: Vec<(&str, Vec<u8>)>, config: LoaderConfig) -> PackageLoader {
    let mut source = MemorySource::new();
    for (name, data) in packages {
        source.insert(name, data);
    }
    PackageLoader::new(source, config)
}
