pub mod ddb;
pub mod deploy;
pub mod ec2;
pub mod net;
pub mod rds;
