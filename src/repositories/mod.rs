pub mod assignment_repo;
pub mod avatar_repo;
pub mod exercise_repo;
pub mod session_repo;
pub mod training_repo;
pub mod user_repo;
pub mod workout_repo;

pub use assignment_repo::AssignmentRepository;
pub use avatar_repo::AvatarRepository;
pub use exercise_repo::ExerciseRepository;
pub use session_repo::SessionRepository;
pub use training_repo::{SessionFinish, TrainingRepository};
pub use user_repo::UserRepository;
pub use workout_repo::WorkoutRepository;
