//! Password hashing seam used by the Auth Gateway.

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, hash: &str) -> bool {
        self.hash(password) == hash
    }
}
