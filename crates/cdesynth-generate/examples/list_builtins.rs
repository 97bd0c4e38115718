use cdesynth_generate::builtin_registry;

fn main() {
    let registry = builtin_registry();
    for name in registry.udf_names() {
        println!("udf {name}");
    }
    for name in registry.relationship_names() {
        println!("relationship {name}");
    }
}
