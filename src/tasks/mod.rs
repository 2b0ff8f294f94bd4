pub mod accelerometer;
pub mod th_sensor;
