use rand::Rng;
use uuid::Builder;

/// Random version-4 UUID string drawn from `rng`, so seeded runs repeat.
pub fn new_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes[..]);
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}
