pub mod assignment;
pub mod avatar;
pub mod exercise;
pub mod from_row;
pub mod stats;
pub mod user;
pub mod workout;
pub mod workout_session;

pub use assignment::{AssignWorkout, AssignmentStatus, DailyWorkoutLog, UpdateAssignmentStatus};
pub use avatar::{Avatar, CreateAvatar};
pub use exercise::{Exercise, ExerciseFilter, ExerciseInput};
pub use from_row::FromSqliteRow;
pub use stats::StatsSummary;
pub use user::{
    ChangePassword, LoginCredentials, RegisterUser, SyncCredentials, SyncCredentialsResult,
    UpdateProfile, UpdateRole, User, UserRole,
};
pub use workout::{
    Difficulty, TodaysWorkout, Workout, WorkoutDay, WorkoutDayDetail, WorkoutDayInput,
    WorkoutDetail, WorkoutExercise, WorkoutExerciseInput, WorkoutFilter, WorkoutInput,
};
pub use workout_session::{
    CompleteExercise, FinishSession, SessionDetail, SessionHistory, SessionLog, SessionProgress,
    SessionStatus, StartSession, WorkoutSession,
};
